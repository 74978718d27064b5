//! ProxyTemplate resolution
//!
//! Each source becomes one stage of a [`CompositeGenerator`], so sources are
//! resolved strictly in order and their outputs appended; there is no merging
//! across sources by name. Failures are prefixed with the source's position
//! and name so operators can find the offending entry.

use std::sync::Arc;

use konvoy_common::crd::{ProxyTemplateConf, ProxyTemplateSource, RawResource, SourceType};
use konvoy_common::yaml::yaml_or_json;

use super::{CompositeGenerator, ProfileRegistry, ResourceGenerator};
use crate::context::Context;
use crate::envoy::WireObject;
use crate::error::GenerateError;
use crate::model::Proxy;
use crate::resource::{Resource, ResourceSet};

/// Generator for a whole template
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    pipeline: CompositeGenerator,
}

impl TemplateGenerator {
    /// Generator resolving `conf` against `profiles`
    pub fn new(name: impl Into<String>, conf: ProxyTemplateConf, profiles: Arc<ProfileRegistry>) -> Self {
        let sources = conf
            .sources
            .into_iter()
            .map(|source| {
                Arc::new(SourceGenerator {
                    source,
                    profiles: Arc::clone(&profiles),
                }) as Arc<dyn ResourceGenerator>
            })
            .collect();
        Self {
            pipeline: CompositeGenerator::new(name, sources).attributed(source_failure),
        }
    }
}

impl ResourceGenerator for TemplateGenerator {
    fn name(&self) -> &str {
        self.pipeline.name()
    }

    fn generate(&self, ctx: &Context, proxy: &Proxy) -> Result<ResourceSet, GenerateError> {
        self.pipeline.generate(ctx, proxy)
    }
}

fn source_failure(index: usize, name: &str, cause: GenerateError) -> GenerateError {
    GenerateError::Source {
        index,
        name: name.to_string(),
        source: Box::new(cause),
    }
}

/// One template source
struct SourceGenerator {
    source: ProxyTemplateSource,
    profiles: Arc<ProfileRegistry>,
}

impl ResourceGenerator for SourceGenerator {
    fn name(&self) -> &str {
        &self.source.name
    }

    fn generate(&self, ctx: &Context, proxy: &Proxy) -> Result<ResourceSet, GenerateError> {
        match self.source.source_type() {
            Some(SourceType::Profile(profile)) => self
                .profiles
                .get(&profile.name)
                .and_then(|generator| generator.generate(ctx, proxy)),
            Some(SourceType::Raw(raw)) => decode_raw_resources(&raw.resources),
            None => Err(GenerateError::InvalidSource),
        }
    }
}

/// Decode literal resources into a set, keeping the declared name and version.
///
/// Each payload is YAML or JSON text whose `@type` selects the wire kind.
pub fn decode_raw_resources(raw: &[RawResource]) -> Result<ResourceSet, GenerateError> {
    raw.iter()
        .enumerate()
        .map(|(index, r)| {
            decode_payload(&r.resource)
                .map(|payload| Resource::new(r.name.clone(), r.version.clone(), payload))
                .map_err(|cause| GenerateError::RawResource {
                    index,
                    name: r.name.clone(),
                    cause,
                })
        })
        .collect()
}

fn decode_payload(text: &str) -> Result<WireObject, String> {
    let value = yaml_or_json(text).map_err(|e| e.to_string())?;
    WireObject::from_json(value).map_err(|e| e.to_string())
}
