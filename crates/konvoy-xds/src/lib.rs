//! Proxy configuration compiler for Konvoy
//!
//! Turns a proxy's declarative mesh state into the named, versioned wire
//! resources a data-plane proxy consumes over xDS:
//!
//! - **Envoy**: the closed wire model (Listener, Cluster, ClusterLoadAssignment)
//!   and the tag-driven decoder for user-supplied fragments
//! - **Generators**: inbound topology, transparent proxying, template sources,
//!   composed through [`CompositeGenerator`](generator::CompositeGenerator)
//! - **RBAC**: TrafficPermission compilation into network RBAC filters
//! - **Compiler**: template resolution and the top-level entry point
//!
//! Generation is pure and synchronous. Every generator is `Send + Sync`, so
//! proxies can be compiled concurrently without extra synchronization.

pub mod compiler;
pub mod context;
pub mod envoy;
pub mod error;
pub mod generator;
pub mod model;
pub mod rbac;
pub mod resource;

pub use compiler::ProxyCompiler;
pub use context::{Context, MeshContext};
pub use error::GenerateError;
pub use generator::{CompositeGenerator, ResourceGenerator};
pub use model::{Proxy, ProxyId, TrafficPermissionMap};
pub use resource::{Resource, ResourceSet};
