//! Resource generators
//!
//! A [`ResourceGenerator`] turns one proxy into a [`ResourceSet`]. Every
//! generator returns its own set; only [`CompositeGenerator`] merges, and it
//! does so all-or-nothing. Profiles and templates are both composites, so
//! naming collisions are reported in one place.

mod inbound;
mod profile;
mod template;
mod transparent;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::Context;
use crate::error::GenerateError;
use crate::model::Proxy;
use crate::resource::ResourceSet;

pub use inbound::InboundProxyGenerator;
pub use profile::ProfileRegistry;
pub use template::{decode_raw_resources, TemplateGenerator};
pub use transparent::TransparentProxyGenerator;

/// A stage producing resources for a proxy.
///
/// Implementations must be pure: same context and proxy, same output.
pub trait ResourceGenerator: Send + Sync {
    /// Human-readable name (used in error messages and logging)
    fn name(&self) -> &str;

    /// Generate this stage's resources
    fn generate(&self, ctx: &Context, proxy: &Proxy) -> Result<ResourceSet, GenerateError>;
}

/// Wraps a stage failure with the stage's position and name
pub type Attribution = fn(usize, &str, GenerateError) -> GenerateError;

fn stage_failure(position: usize, generator: &str, cause: GenerateError) -> GenerateError {
    GenerateError::Generator {
        position,
        generator: generator.to_string(),
        source: Box::new(cause),
    }
}

/// Ordered pipeline of generators merged into one result
///
/// Generators run in order. The first failure discards everything merged so
/// far and is returned wrapped with the failing generator's position and name
/// (`generator[<i>] <name>: ...` unless [`attributed`](Self::attributed)
/// says otherwise).
#[derive(Clone)]
pub struct CompositeGenerator {
    name: String,
    generators: Vec<Arc<dyn ResourceGenerator>>,
    attribution: Attribution,
}

impl CompositeGenerator {
    /// Pipeline running `generators` in order
    pub fn new(name: impl Into<String>, generators: Vec<Arc<dyn ResourceGenerator>>) -> Self {
        Self {
            name: name.into(),
            generators,
            attribution: stage_failure,
        }
    }

    /// Use `attribution` to wrap stage failures
    pub fn attributed(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }

    /// Names of the stages, in order
    pub fn stages(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name()).collect()
    }
}

impl std::fmt::Debug for CompositeGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeGenerator")
            .field("name", &self.name)
            .field("stages", &self.stages())
            .finish()
    }
}

impl ResourceGenerator for CompositeGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, ctx: &Context, proxy: &Proxy) -> Result<ResourceSet, GenerateError> {
        let mut merged = ResourceSet::new();
        for (position, generator) in self.generators.iter().enumerate() {
            let output = generator.generate(ctx, proxy).map_err(|e| {
                warn!(
                    proxy = %proxy.id,
                    generator = generator.name(),
                    position,
                    error = %e,
                    "generator failed, discarding partial output"
                );
                (self.attribution)(position, generator.name(), e)
            })?;
            debug!(
                proxy = %proxy.id,
                generator = generator.name(),
                resources = output.len(),
                "generator finished"
            );
            merged.extend(output);
        }

        for (kind, name) in merged.duplicate_names() {
            warn!(
                proxy = %proxy.id,
                generator = %self.name,
                ?kind,
                name = %name,
                "duplicate resource name"
            );
        }
        Ok(merged)
    }
}
