//! TrafficPermission CRD: which services may reach which
//!
//! Selection of the permissions that apply to a given dataplane happens
//! before compilation; this module only describes the declarative shape.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{default_mesh, qualified_name};

/// Spec for a TrafficPermission
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "konvoy.io",
    version = "v1alpha1",
    kind = "TrafficPermission",
    plural = "trafficpermissions",
    shortname = "tp",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct TrafficPermissionSpec {
    /// Mesh this permission belongs to
    #[serde(default = "default_mesh")]
    pub mesh: String,

    /// Allow rules
    #[serde(default)]
    pub rules: Vec<PermissionRule>,
}

/// One allow rule: traffic from any of `sources` to any of `destinations`
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRule {
    /// Callers allowed by this rule
    #[serde(default)]
    pub sources: Vec<Selector>,
    /// Callees this rule applies to
    #[serde(default)]
    pub destinations: Vec<Selector>,
}

/// Exact-match tag selector
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct Selector {
    /// Tags that must all match
    #[serde(rename = "match", default)]
    pub match_: BTreeMap<String, String>,
}

impl Selector {
    /// Selector matching a single tag
    pub fn tag(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut match_ = BTreeMap::new();
        match_.insert(key.into(), value.into());
        Self { match_ }
    }

    /// Value of a tag in this selector
    pub fn get(&self, key: &str) -> Option<&str> {
        self.match_.get(key).map(String::as_str)
    }
}

impl TrafficPermission {
    /// Stable `<name>.<namespace>` identity of this permission
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.metadata)
    }

    /// Mesh this permission belongs to
    pub fn mesh(&self) -> &str {
        &self.spec.mesh
    }
}
