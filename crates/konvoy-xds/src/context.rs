//! Mesh-wide context shared by every generator in one compilation

use std::sync::Arc;

use konvoy_common::config::XdsConfig;

/// Mesh settings relevant to generation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshContext {
    /// Mesh name
    pub name: String,
    /// Whether mutual TLS, and with it RBAC enforcement, is on
    pub mtls_enabled: bool,
}

impl MeshContext {
    /// Context for a mesh
    pub fn new(name: impl Into<String>, mtls_enabled: bool) -> Self {
        Self {
            name: name.into(),
            mtls_enabled,
        }
    }
}

/// Read-only context handed to generators
#[derive(Clone, Debug, Default)]
pub struct Context {
    /// Mesh the proxy belongs to
    pub mesh: MeshContext,
    /// Compiler settings
    pub config: Arc<XdsConfig>,
}

impl Context {
    /// Context for `mesh` with the given settings
    pub fn new(mesh: MeshContext, config: Arc<XdsConfig>) -> Self {
        Self { mesh, config }
    }
}
