//! Listeners (LDS)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::address::Address;
use super::filter::{FilterConfig, Rbac, TcpProxy};
use super::validate::{embedded, embedded_each, min_len, required, Validate, ValidationError};

/// Well-known name of the TCP proxy filter
pub const TCP_PROXY_FILTER: &str = "envoy.tcp_proxy";
/// Well-known name of the network RBAC filter
pub const RBAC_FILTER: &str = "envoy.filters.network.rbac";

/// Where the proxy accepts connections
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listener {
    /// Wire name
    #[serde(default)]
    pub name: String,
    /// Address to listen on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Filter chains; the first matching chain handles a connection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_chains: Vec<FilterChain>,
    /// Hand redirected connections to the listener owning their original destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_original_dst: Option<bool>,
    /// Legacy options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecated_v1: Option<DeprecatedV1>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Legacy listener options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecatedV1 {
    /// `false` when the listener is only reached through redirection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_to_port: Option<bool>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Ordered network filters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChain {
    /// Filters, evaluated in order
    #[serde(default)]
    pub filters: Vec<Filter>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A named network filter
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// Filter name
    #[serde(default)]
    pub name: String,
    /// Filter config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typed_config: Option<FilterConfig>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Filter {
    /// TCP proxy forwarding to `cluster`
    pub fn tcp_proxy(cluster: impl Into<String>) -> Self {
        let cluster = cluster.into();
        Self {
            name: TCP_PROXY_FILTER.to_string(),
            typed_config: Some(FilterConfig::TcpProxy(TcpProxy {
                stat_prefix: cluster.clone(),
                cluster,
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    /// RBAC filter with the given config
    pub fn rbac(config: Rbac) -> Self {
        Self {
            name: RBAC_FILTER.to_string(),
            typed_config: Some(FilterConfig::Rbac(config)),
            ..Default::default()
        }
    }
}

impl Listener {
    /// Listener bound to `address:port` with a single filter chain
    pub fn new(name: impl Into<String>, address: impl Into<String>, port: u32, filters: Vec<Filter>) -> Self {
        Self {
            name: name.into(),
            address: Some(Address::socket(address, port)),
            filter_chains: vec![FilterChain {
                filters,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    /// Do not bind the port; connections arrive through redirection
    pub fn without_binding(mut self) -> Self {
        self.deprecated_v1 = Some(DeprecatedV1 {
            bind_to_port: Some(false),
            ..Default::default()
        });
        self
    }

    /// Whether the listener binds its own port
    pub fn binds_to_port(&self) -> bool {
        self.deprecated_v1
            .as_ref()
            .and_then(|v1| v1.bind_to_port)
            .unwrap_or(true)
    }

    /// Filters of every chain, in order
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.filter_chains.iter().flat_map(|chain| &chain.filters)
    }
}

impl Validate for Listener {
    fn validate(&self) -> Result<(), ValidationError> {
        min_len("Listener", "Name", &self.name)?;
        let address = required("Listener", "Address", &self.address)?;
        embedded("Listener", "Address", address)?;
        embedded_each("Listener", "FilterChains", &self.filter_chains)
    }
}

impl Validate for FilterChain {
    fn validate(&self) -> Result<(), ValidationError> {
        embedded_each("FilterChain", "Filters", &self.filters)
    }
}

impl Validate for Filter {
    fn validate(&self) -> Result<(), ValidationError> {
        min_len("Filter", "Name", &self.name)?;
        match &self.typed_config {
            Some(config) => embedded("Filter", "TypedConfig", config),
            None => Ok(()),
        }
    }
}
