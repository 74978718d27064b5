//! Per-compilation input model

use std::collections::BTreeMap;

use konvoy_common::crd::{Dataplane, InboundInterface, TrafficPermission};

/// Identity of a proxy
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyId {
    /// Qualified dataplane name
    pub name: String,
    /// Mesh the proxy belongs to
    pub mesh: String,
}

impl std::fmt::Display for ProxyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.mesh, self.name)
    }
}

/// Permissions that apply to each inbound interface, matched upstream
pub type TrafficPermissionMap = BTreeMap<InboundInterface, Vec<TrafficPermission>>;

/// Everything needed to compile one proxy's configuration
///
/// Immutable for the duration of a compilation.
#[derive(Clone, Debug)]
pub struct Proxy {
    /// Identity
    pub id: ProxyId,
    /// Network topology
    pub dataplane: Dataplane,
    /// Pre-matched permissions per inbound interface
    pub traffic_permissions: TrafficPermissionMap,
}

impl Proxy {
    /// Proxy for a dataplane with no permissions
    pub fn new(dataplane: Dataplane) -> Self {
        Self {
            id: ProxyId {
                name: dataplane.qualified_name(),
                mesh: dataplane.mesh().to_string(),
            },
            dataplane,
            traffic_permissions: TrafficPermissionMap::new(),
        }
    }

    /// Attach pre-matched permissions
    pub fn with_traffic_permissions(mut self, traffic_permissions: TrafficPermissionMap) -> Self {
        self.traffic_permissions = traffic_permissions;
        self
    }

    /// Version stamped on generated resources, if the dataplane has been persisted
    pub fn version(&self) -> Option<&str> {
        self.dataplane.version()
    }

    /// Permissions matched to `interface`; empty when none were matched
    pub fn permissions_for(&self, interface: &InboundInterface) -> &[TrafficPermission] {
        self.traffic_permissions
            .get(interface)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
