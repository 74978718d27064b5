//! Top-level proxy compilation
//!
//! The `ProxyCompiler` picks the ProxyTemplate that applies to a proxy (or
//! falls back to the configured default profile) and runs it. It holds only
//! read-only state, so one instance can serve every worker thread.

use std::sync::Arc;

use tracing::{info, instrument};

use konvoy_common::config::XdsConfig;
use konvoy_common::crd::{ProxyTemplate, ProxyTemplateConf};

use crate::context::{Context, MeshContext};
use crate::error::GenerateError;
use crate::generator::{ProfileRegistry, ResourceGenerator, TemplateGenerator};
use crate::model::Proxy;
use crate::resource::ResourceSet;

/// Compiles proxies into resource sets
#[derive(Clone, Debug)]
pub struct ProxyCompiler {
    profiles: Arc<ProfileRegistry>,
    config: Arc<XdsConfig>,
}

impl ProxyCompiler {
    /// Create a compiler
    ///
    /// # Arguments
    /// * `profiles` - Registry built once at startup
    /// * `config` - Generator settings
    pub fn new(profiles: Arc<ProfileRegistry>, config: XdsConfig) -> Self {
        Self {
            profiles,
            config: Arc::new(config),
        }
    }

    /// Registered profiles
    pub fn profiles(&self) -> &ProfileRegistry {
        &self.profiles
    }

    /// Settings in use
    pub fn config(&self) -> &XdsConfig {
        &self.config
    }

    /// Template that applies to `proxy`.
    ///
    /// The first candidate in the proxy's mesh, ordered by qualified name,
    /// wins. Without one the default profile is used.
    pub fn resolve_template(&self, proxy: &Proxy, candidates: &[ProxyTemplate]) -> (String, ProxyTemplateConf) {
        candidates
            .iter()
            .filter(|t| t.mesh() == proxy.id.mesh)
            .min_by_key(|t| t.qualified_name())
            .map(|t| (t.qualified_name(), t.spec.conf.clone()))
            .unwrap_or_else(|| {
                (
                    self.config.default_profile.clone(),
                    ProxyTemplateConf::from_profile(self.config.default_profile.clone()),
                )
            })
    }

    /// Compile `proxy` into its complete resource set.
    ///
    /// Either every resource is returned or none is.
    #[instrument(skip_all, fields(proxy = %proxy.id))]
    pub fn compile(
        &self,
        mesh: MeshContext,
        proxy: &Proxy,
        templates: &[ProxyTemplate],
    ) -> Result<ResourceSet, GenerateError> {
        let (template, conf) = self.resolve_template(proxy, templates);
        let ctx = Context::new(mesh, Arc::clone(&self.config));
        let generator = TemplateGenerator::new(template.clone(), conf, Arc::clone(&self.profiles));
        let resources = generator.generate(&ctx, proxy)?;
        info!(template = %template, resources = resources.len(), "compiled proxy");
        Ok(resources)
    }
}
