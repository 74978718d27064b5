//! Endpoint assignments (EDS)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::address::Address;
use super::validate::{embedded, embedded_each, min_len, Validate, ValidationError};

/// Concrete endpoints behind a cluster
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterLoadAssignment {
    /// Name of the cluster these endpoints belong to
    #[serde(default)]
    pub cluster_name: String,
    /// Endpoints grouped by locality
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<LocalityLbEndpoints>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Endpoints sharing a locality
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalityLbEndpoints {
    /// Load-balanced endpoints
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lb_endpoints: Vec<LbEndpoint>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One load-balanced endpoint
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LbEndpoint {
    /// Upstream host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Upstream host identifier
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Address of the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClusterLoadAssignment {
    /// Assignment with no endpoints
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            ..Default::default()
        }
    }

    /// Assignment with a single endpoint at `address:port`
    pub fn single(cluster_name: impl Into<String>, address: impl Into<String>, port: u32) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            endpoints: vec![LocalityLbEndpoints {
                lb_endpoints: vec![LbEndpoint {
                    endpoint: Some(Endpoint {
                        address: Some(Address::socket(address, port)),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// Every endpoint address, in declaration order
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.endpoints
            .iter()
            .flat_map(|locality| &locality.lb_endpoints)
            .filter_map(|lb| lb.endpoint.as_ref())
            .filter_map(|endpoint| endpoint.address.as_ref())
    }
}

impl Validate for ClusterLoadAssignment {
    fn validate(&self) -> Result<(), ValidationError> {
        min_len("ClusterLoadAssignment", "ClusterName", &self.cluster_name)?;
        embedded_each("ClusterLoadAssignment", "Endpoints", &self.endpoints)
    }
}

impl Validate for LocalityLbEndpoints {
    fn validate(&self) -> Result<(), ValidationError> {
        embedded_each("LocalityLbEndpoints", "LbEndpoints", &self.lb_endpoints)
    }
}

impl Validate for LbEndpoint {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.endpoint {
            Some(endpoint) => embedded("LbEndpoint", "Endpoint", endpoint),
            None => Ok(()),
        }
    }
}

impl Validate for Endpoint {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.address {
            Some(address) => embedded("Endpoint", "Address", address),
            None => Ok(()),
        }
    }
}
