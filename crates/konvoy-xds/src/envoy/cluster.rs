//! Upstream clusters (CDS)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::endpoint::ClusterLoadAssignment;
use super::validate::{embedded, min_len, positive_duration, Validate, ValidationError};
use konvoy_common::mesh::LOCALHOST;

/// Group of upstream hosts the proxy forwards to
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Wire name
    #[serde(default)]
    pub name: String,
    /// How the cluster discovers its hosts
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<DiscoveryType>,
    /// Load balancing across hosts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lb_policy: Option<LbPolicy>,
    /// Timeout for new upstream connections, e.g. `5s`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<String>,
    /// Static endpoint list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_assignment: Option<ClusterLoadAssignment>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Service discovery type of a cluster
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscoveryType {
    /// Fixed endpoint list
    Static,
    /// DNS, all returned addresses
    StrictDns,
    /// DNS, first returned address
    LogicalDns,
    /// Endpoints from EDS
    Eds,
    /// Destination recovered from a redirected connection
    OriginalDst,
}

/// Load balancing policy of a cluster
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LbPolicy {
    /// Round robin
    RoundRobin,
    /// Least request
    LeastRequest,
    /// Consistent hashing ring
    RingHash,
    /// Random
    Random,
    /// Required with [`DiscoveryType::OriginalDst`]
    #[serde(rename = "ORIGINAL_DST_LB")]
    OriginalDstLb,
    /// Maglev consistent hashing
    Maglev,
    /// Load balancing is chosen by the cluster implementation
    ClusterProvided,
    /// Policy set through `loadBalancingPolicy`
    LoadBalancingPolicyConfig,
}

impl Cluster {
    /// Static cluster with one endpoint on localhost
    pub fn local(name: impl Into<String>, port: u32, connect_timeout: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            load_assignment: Some(ClusterLoadAssignment::single(name.clone(), LOCALHOST, port)),
            name,
            type_: Some(DiscoveryType::Static),
            connect_timeout: Some(connect_timeout.into()),
            ..Default::default()
        }
    }

    /// Cluster forwarding to the original destination of a redirected connection
    pub fn original_destination(name: impl Into<String>, connect_timeout: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_: Some(DiscoveryType::OriginalDst),
            lb_policy: Some(LbPolicy::OriginalDstLb),
            connect_timeout: Some(connect_timeout.into()),
            ..Default::default()
        }
    }
}

impl Validate for Cluster {
    fn validate(&self) -> Result<(), ValidationError> {
        min_len("Cluster", "Name", &self.name)?;
        if let Some(timeout) = &self.connect_timeout {
            positive_duration("Cluster", "ConnectTimeout", timeout)?;
        }
        if let Some(cla) = &self.load_assignment {
            embedded("Cluster", "LoadAssignment", cla)?;
        }
        Ok(())
    }
}
