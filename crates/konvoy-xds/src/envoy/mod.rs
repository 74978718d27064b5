//! Envoy v2 wire model
//!
//! Only the fields Konvoy generates or inspects are typed. The set of
//! top-level kinds is closed: anything outside [`WireObject`] is rejected at
//! decode time. Within a known kind, fields and filter configs without a
//! typed model are kept verbatim in each message's `extra` map and emitted
//! again on serialization.
//!
//! Field names follow the proto3 JSON mapping (camelCase), so a value
//! serialized here is exactly what a user would write in a raw template
//! source.

mod address;
mod cluster;
mod endpoint;
mod filter;
mod listener;
mod validate;

pub use self::address::{Address, SocketAddress};
pub use self::cluster::{Cluster, DiscoveryType, LbPolicy};
pub use self::endpoint::{ClusterLoadAssignment, Endpoint, LbEndpoint, LocalityLbEndpoints};
pub use self::filter::{
    Authenticated, FilterConfig, Permission, Principal, Rbac, RbacAction, RbacPolicy, RbacRules,
    StringMatcher, TcpProxy,
};
pub use self::listener::{DeprecatedV1, Filter, FilterChain, Listener, RBAC_FILTER, TCP_PROXY_FILTER};
pub use self::validate::{Validate, ValidationError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Prefix of every type URL
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// Fully-qualified message name of a Listener
pub const LISTENER_TYPE: &str = "envoy.api.v2.Listener";
/// Fully-qualified message name of a Cluster
pub const CLUSTER_TYPE: &str = "envoy.api.v2.Cluster";
/// Fully-qualified message name of a ClusterLoadAssignment
pub const CLUSTER_LOAD_ASSIGNMENT_TYPE: &str = "envoy.api.v2.ClusterLoadAssignment";
/// Fully-qualified message name of the TCP proxy filter config
pub const TCP_PROXY_TYPE: &str = "envoy.config.filter.network.tcp_proxy.v2.TcpProxy";
/// Fully-qualified message name of the network RBAC filter config
pub const RBAC_TYPE: &str = "envoy.config.filter.network.rbac.v2.RBAC";

/// JSON key carrying a message's type URL
const TYPE_KEY: &str = "@type";

/// Kinds of top-level xDS resources
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// LDS
    Listener,
    /// CDS
    Cluster,
    /// EDS
    ClusterLoadAssignment,
}

impl ResourceKind {
    /// Fully-qualified message name
    pub fn message_type(self) -> &'static str {
        match self {
            ResourceKind::Listener => LISTENER_TYPE,
            ResourceKind::Cluster => CLUSTER_TYPE,
            ResourceKind::ClusterLoadAssignment => CLUSTER_LOAD_ASSIGNMENT_TYPE,
        }
    }

    /// Type URL used to key discovery requests
    pub fn type_url(self) -> String {
        format!("{}{}", TYPE_URL_PREFIX, self.message_type())
    }
}

/// A top-level xDS resource payload
///
/// Serializes with its `@type` tag inline, the same shape as a protobuf
/// `Any` in JSON form.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "@type")]
pub enum WireObject {
    /// Listener
    #[serde(rename = "type.googleapis.com/envoy.api.v2.Listener")]
    Listener(Listener),
    /// Cluster
    #[serde(rename = "type.googleapis.com/envoy.api.v2.Cluster")]
    Cluster(Cluster),
    /// ClusterLoadAssignment
    #[serde(rename = "type.googleapis.com/envoy.api.v2.ClusterLoadAssignment")]
    ClusterLoadAssignment(ClusterLoadAssignment),
}

/// Why a textual payload could not become a [`WireObject`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// The payload carries no `@type` tag
    #[error("Any JSON doesn't have '@type'")]
    MissingType,
    /// The tag names a message this control plane does not know
    #[error("unknown message type {0:?}")]
    UnknownType(String),
    /// The tag names a known message that is not a top-level resource
    #[error("message type {0:?} doesn't implement all required interfaces")]
    NotAResource(String),
    /// The body does not match the message schema
    #[error("{0}")]
    Malformed(String),
    /// The body decoded but violates a field constraint
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

impl WireObject {
    /// Kind of this resource
    pub fn kind(&self) -> ResourceKind {
        match self {
            WireObject::Listener(_) => ResourceKind::Listener,
            WireObject::Cluster(_) => ResourceKind::Cluster,
            WireObject::ClusterLoadAssignment(_) => ResourceKind::ClusterLoadAssignment,
        }
    }

    /// Wire name embedded in the payload
    pub fn name(&self) -> &str {
        match self {
            WireObject::Listener(l) => &l.name,
            WireObject::Cluster(c) => &c.name,
            WireObject::ClusterLoadAssignment(cla) => &cla.cluster_name,
        }
    }

    /// Decode a JSON value carrying an `@type` tag.
    ///
    /// The tag selects the message schema. Typed fields must match that
    /// schema and pass its field constraints; other fields are kept as-is.
    pub fn from_json(value: Value) -> Result<Self, DecodeError> {
        let Value::Object(mut fields) = value else {
            return Err(DecodeError::MissingType);
        };
        let type_url = match fields.remove(TYPE_KEY) {
            Some(Value::String(type_url)) => type_url,
            _ => return Err(DecodeError::MissingType),
        };
        let message_type = message_name(&type_url);
        let body = Value::Object(fields);

        let object = match message_type {
            LISTENER_TYPE => WireObject::Listener(decode_body(body)?),
            CLUSTER_TYPE => WireObject::Cluster(decode_body(body)?),
            CLUSTER_LOAD_ASSIGNMENT_TYPE => WireObject::ClusterLoadAssignment(decode_body(body)?),
            TCP_PROXY_TYPE | RBAC_TYPE => {
                return Err(DecodeError::NotAResource(message_type.to_string()))
            }
            other => return Err(DecodeError::UnknownType(other.to_string())),
        };
        object.validate()?;
        Ok(object)
    }

    /// Serialize to a JSON value, `@type` included
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Validate for WireObject {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            WireObject::Listener(l) => l.validate(),
            WireObject::Cluster(c) => c.validate(),
            WireObject::ClusterLoadAssignment(cla) => cla.validate(),
        }
    }
}

impl From<Listener> for WireObject {
    fn from(listener: Listener) -> Self {
        WireObject::Listener(listener)
    }
}

impl From<Cluster> for WireObject {
    fn from(cluster: Cluster) -> Self {
        WireObject::Cluster(cluster)
    }
}

impl From<ClusterLoadAssignment> for WireObject {
    fn from(cla: ClusterLoadAssignment) -> Self {
        WireObject::ClusterLoadAssignment(cla)
    }
}

/// Message name of a type URL, e.g. `envoy.api.v2.Cluster`
pub(crate) fn message_name(type_url: &str) -> &str {
    type_url.rsplit_once('/').map_or(type_url, |(_, name)| name)
}

fn decode_body<T: DeserializeOwned>(body: Value) -> Result<T, DecodeError> {
    serde_json::from_value(body).map_err(|e| DecodeError::Malformed(e.to_string()))
}
