//! Named, versioned wire resources

use std::collections::BTreeMap;

use serde::Serialize;

use konvoy_common::hash::deterministic_hash;

use crate::envoy::{ResourceKind, WireObject};
use crate::error::GenerateError;

/// A named, versioned unit of proxy configuration
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resource {
    /// Wire identity, unique within the set delivered to one proxy
    pub name: String,
    /// Changes iff the payload changes
    pub version: String,
    /// Wire object
    #[serde(rename = "resource")]
    pub payload: WireObject,
}

impl Resource {
    /// Resource with an explicit version
    pub fn new(name: impl Into<String>, version: impl Into<String>, payload: impl Into<WireObject>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            payload: payload.into(),
        }
    }

    /// Resource versioned by `version`, or by a hash of its payload when the
    /// source object has not been persisted yet.
    pub fn versioned(
        name: impl Into<String>,
        version: Option<&str>,
        payload: impl Into<WireObject>,
    ) -> Result<Self, GenerateError> {
        let payload = payload.into();
        let version = match version {
            Some(version) => version.to_string(),
            None => content_version(&payload)?,
        };
        Ok(Self {
            name: name.into(),
            version,
            payload,
        })
    }

    /// Kind of the payload
    pub fn kind(&self) -> ResourceKind {
        self.payload.kind()
    }
}

fn content_version(payload: &WireObject) -> Result<String, GenerateError> {
    let bytes = serde_json::to_vec(payload)
        .map_err(|e| GenerateError::internal(format!("failed to serialize payload: {}", e)))?;
    Ok(deterministic_hash(&bytes))
}

/// Ordered sequence of resources
///
/// Order is significant: it is the order generators ran in and the order
/// downstream collision detection sees.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ResourceSet {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    resources: Vec<Resource>,
}

impl ResourceSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one resource
    pub fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    /// Append every resource of `other`, keeping its order
    pub fn extend(&mut self, other: ResourceSet) {
        self.resources.extend(other.resources);
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resources in order
    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }

    /// Resource names in order
    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }

    /// First resource with the given name
    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Resources of one kind, in order
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(move |r| r.kind() == kind)
    }

    /// Names that appear more than once for the same kind
    ///
    /// Distribution rejects such sets; the compiler only reports them.
    pub fn duplicate_names(&self) -> Vec<(ResourceKind, String)> {
        let mut seen: BTreeMap<(ResourceKind, &str), usize> = BTreeMap::new();
        for resource in &self.resources {
            *seen.entry((resource.kind(), resource.name.as_str())).or_default() += 1;
        }
        seen.into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((kind, name), _)| (kind, name.to_string()))
            .collect()
    }

    /// Render as a discovery-response-like JSON document
    pub fn to_discovery_response(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl FromIterator<Resource> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self {
            resources: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResourceSet {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}
