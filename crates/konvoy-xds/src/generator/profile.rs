//! Predefined generator compositions, looked up by name
//!
//! The registry is built once and shared read-only; profile names are part
//! of the declarative API that ProxyTemplate authors rely on.

use std::collections::BTreeMap;
use std::sync::Arc;

use konvoy_common::mesh::PROFILE_DEFAULT_PROXY;

use super::{CompositeGenerator, InboundProxyGenerator, ResourceGenerator, TransparentProxyGenerator};
use crate::error::GenerateError;

/// Read-only table of named profiles
#[derive(Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, Arc<dyn ResourceGenerator>>,
}

impl ProfileRegistry {
    /// Registry with no profiles
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry holding the built-in profiles
    pub fn builtin() -> Self {
        Self::empty().with_profile(
            PROFILE_DEFAULT_PROXY,
            Arc::new(CompositeGenerator::new(
                PROFILE_DEFAULT_PROXY,
                vec![
                    Arc::new(TransparentProxyGenerator),
                    Arc::new(InboundProxyGenerator),
                ],
            )),
        )
    }

    /// Add or replace a profile; only usable while building the registry
    pub fn with_profile(mut self, name: impl Into<String>, generator: Arc<dyn ResourceGenerator>) -> Self {
        self.profiles.insert(name.into(), generator);
        self
    }

    /// Look up a profile by name
    pub fn get(&self, name: &str) -> Result<Arc<dyn ResourceGenerator>, GenerateError> {
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| GenerateError::UnknownProfile {
                name: name.to_string(),
            })
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ProfileRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
