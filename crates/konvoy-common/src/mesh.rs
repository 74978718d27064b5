//! Service mesh constants for the Konvoy data plane
//!
//! Single source of truth for names, ports and identity formats that both
//! the generators and the declarative API depend on.

// =============================================================================
// Addresses
// =============================================================================

/// Address the sidecar uses to reach the co-located workload.
pub const LOCALHOST: &str = "127.0.0.1";

/// Wildcard bind address for the transparent-proxying catch-all listener.
pub const ANY_ADDRESS: &str = "0.0.0.0";

// =============================================================================
// Well-known resource names
// =============================================================================

/// Name of the listener that receives kernel-redirected traffic.
pub const CATCH_ALL_LISTENER: &str = "catch_all";

/// Name of the original-destination cluster behind the catch-all listener.
pub const PASS_THROUGH_CLUSTER: &str = "pass_through";

/// Built-in profile combining transparent proxying and inbound topology.
pub const PROFILE_DEFAULT_PROXY: &str = "default-proxy";

// =============================================================================
// Tags
// =============================================================================

/// Tag key carrying a workload's service identity.
pub const SERVICE_TAG: &str = "service";

// =============================================================================
// Naming Helpers
// =============================================================================

/// Name of the cluster that forwards to a workload port on localhost.
pub fn local_cluster_name(workload_port: u32) -> String {
    format!("localhost:{}", workload_port)
}

/// Name of the listener bound to an inbound interface.
pub fn inbound_listener_name(address: &str, port: u32) -> String {
    format!("inbound:{}:{}", address, port)
}

// =============================================================================
// Trust Domain Helpers
// =============================================================================

/// SPIFFE identity helpers.
///
/// Konvoy uses one trust domain per mesh: `spiffe://{mesh}/{service}`.
pub mod trust_domain {
    /// Build the SPIFFE principal for a service in a mesh.
    ///
    /// Unlike some meshes, the `spiffe://` prefix is part of the principal:
    /// the data plane matches it exactly against the peer certificate URI SAN.
    pub fn principal(mesh: &str, service: &str) -> String {
        format!("spiffe://{}/{}", mesh, service)
    }
}
