//! Network filter configs
//!
//! Filter configs travel as `typedConfig` with their own `@type` tag. The
//! two configs Konvoy generates are typed; any other tag is carried as an
//! opaque object so that hand-written listeners keep their filters.

use std::collections::BTreeMap;

use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::validate::{min_len, Validate, ValidationError};
use super::{message_name, DecodeError, RBAC_TYPE, TCP_PROXY_TYPE, TYPE_KEY, TYPE_URL_PREFIX};

/// Typed config of a network filter
#[derive(Clone, Debug, PartialEq)]
pub enum FilterConfig {
    /// TCP forwarding
    TcpProxy(TcpProxy),
    /// Role-based access control
    Rbac(Rbac),
    /// Any other filter config, `@type` included
    Opaque(Map<String, Value>),
}

impl FilterConfig {
    /// Message name of this config
    pub fn message_type(&self) -> &str {
        match self {
            FilterConfig::TcpProxy(_) => TCP_PROXY_TYPE,
            FilterConfig::Rbac(_) => RBAC_TYPE,
            FilterConfig::Opaque(fields) => fields
                .get(TYPE_KEY)
                .and_then(Value::as_str)
                .map_or("", message_name),
        }
    }
}

#[derive(Serialize)]
struct Tagged<'a, T> {
    #[serde(rename = "@type")]
    type_url: String,
    #[serde(flatten)]
    body: &'a T,
}

impl Serialize for FilterConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let type_url = format!("{}{}", TYPE_URL_PREFIX, self.message_type());
        match self {
            FilterConfig::TcpProxy(body) => Tagged { type_url, body }.serialize(serializer),
            FilterConfig::Rbac(body) => Tagged { type_url, body }.serialize(serializer),
            FilterConfig::Opaque(fields) if fields.contains_key(TYPE_KEY) => {
                fields.serialize(serializer)
            }
            FilterConfig::Opaque(_) => Err(ser::Error::custom(DecodeError::MissingType)),
        }
    }
}

impl<'de> Deserialize<'de> for FilterConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let message_type = match fields.get(TYPE_KEY) {
            Some(Value::String(type_url)) => message_name(type_url).to_string(),
            _ => return Err(de::Error::custom(DecodeError::MissingType)),
        };
        match message_type.as_str() {
            TCP_PROXY_TYPE => {
                fields.remove(TYPE_KEY);
                serde_json::from_value(Value::Object(fields))
                    .map(FilterConfig::TcpProxy)
                    .map_err(de::Error::custom)
            }
            RBAC_TYPE => {
                fields.remove(TYPE_KEY);
                serde_json::from_value(Value::Object(fields))
                    .map(FilterConfig::Rbac)
                    .map_err(de::Error::custom)
            }
            _ => Ok(FilterConfig::Opaque(fields)),
        }
    }
}

/// Forwards TCP connections to a cluster
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpProxy {
    /// Prefix for emitted statistics
    #[serde(default)]
    pub stat_prefix: String,
    /// Upstream cluster
    #[serde(default)]
    pub cluster: String,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Network RBAC filter
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rbac {
    /// Prefix for emitted statistics
    #[serde(default)]
    pub stat_prefix: String,
    /// Policies to enforce; absent means no enforcement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<RbacRules>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Action plus named policies
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacRules {
    /// What a matching policy does; `ALLOW` is the proto default and is omitted
    #[serde(default, skip_serializing_if = "RbacAction::is_allow")]
    pub action: RbacAction,
    /// Policies by name
    #[serde(default)]
    pub policies: BTreeMap<String, RbacPolicy>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// RBAC action
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RbacAction {
    /// Connections matching a policy are allowed, all others denied
    #[default]
    Allow,
    /// Connections matching a policy are denied
    Deny,
}

impl RbacAction {
    fn is_allow(&self) -> bool {
        *self == RbacAction::Allow
    }
}

/// A policy matches when any permission and any principal match
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacPolicy {
    /// What the connection may do
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// Who may do it
    #[serde(default)]
    pub principals: Vec<Principal>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Action match of a policy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    /// Matches every action
    Any(bool),
    /// Any other permission rule, kept verbatim
    #[serde(untagged)]
    Other(Map<String, Value>),
}

/// Downstream identity match of a policy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Principal {
    /// Matches every downstream
    Any(bool),
    /// Matches the peer certificate's identity
    Authenticated(Authenticated),
    /// Any other principal rule, kept verbatim
    #[serde(untagged)]
    Other(Map<String, Value>),
}

/// Peer certificate match
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authenticated {
    /// Match against the URI SAN, or the subject when there is none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal_name: Option<StringMatcher>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// String match; exactly one field is expected to be set
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringMatcher {
    /// Exact match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
    /// Prefix match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Suffix match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Principal {
    /// Authenticated peer whose identity equals `name`
    pub fn authenticated_exact(name: impl Into<String>) -> Self {
        Principal::Authenticated(Authenticated {
            principal_name: Some(StringMatcher {
                exact: Some(name.into()),
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

impl Validate for FilterConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            FilterConfig::TcpProxy(tcp) => tcp.validate(),
            FilterConfig::Rbac(rbac) => rbac.validate(),
            FilterConfig::Opaque(_) => Ok(()),
        }
    }
}

impl Validate for TcpProxy {
    fn validate(&self) -> Result<(), ValidationError> {
        min_len("TcpProxy", "StatPrefix", &self.stat_prefix)?;
        min_len("TcpProxy", "Cluster", &self.cluster)
    }
}

impl Validate for Rbac {
    fn validate(&self) -> Result<(), ValidationError> {
        min_len("RBAC", "StatPrefix", &self.stat_prefix)
    }
}
