//! ProxyTemplate CRD: how a dataplane's configuration is assembled
//!
//! A template is an ordered list of sources. Each source is either a
//! reference to a built-in profile or a list of literal ("raw") wire
//! resources written by the user in YAML or JSON.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{default_mesh, qualified_name};

/// Spec for a ProxyTemplate
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "konvoy.io",
    version = "v1alpha1",
    kind = "ProxyTemplate",
    plural = "proxytemplates",
    shortname = "pt",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct ProxyTemplateSpec {
    /// Mesh this template belongs to
    #[serde(default = "default_mesh")]
    pub mesh: String,

    /// Template body
    #[serde(default)]
    pub conf: ProxyTemplateConf,
}

/// Ordered sources making up a template
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyTemplateConf {
    /// Sources, resolved strictly in order
    #[serde(default)]
    pub sources: Vec<ProxyTemplateSource>,
}

/// One template source; exactly one of `profile` or `raw` must be set
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyTemplateSource {
    /// Name used to point at this source in error messages
    #[serde(default)]
    pub name: String,

    /// Reference to a predefined profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileSource>,

    /// Literal wire resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawSource>,
}

/// Reference to a predefined profile
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct ProfileSource {
    /// Profile name (e.g. `default-proxy`)
    pub name: String,
}

/// Literal wire resources
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct RawSource {
    /// Resources in the order they will be emitted
    #[serde(default)]
    pub resources: Vec<RawResource>,
}

/// A single literal wire resource
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct RawResource {
    /// Wire name of the resource
    pub name: String,
    /// Version reported to the proxy
    pub version: String,
    /// YAML or JSON text carrying an `@type` tag
    pub resource: String,
}

/// Borrowed view of a source's kind
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SourceType<'a> {
    /// `profile` is set
    Profile(&'a ProfileSource),
    /// `raw` is set
    Raw(&'a RawSource),
}

impl ProxyTemplateSource {
    /// Source referencing a profile
    pub fn profile(name: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile: Some(ProfileSource {
                name: profile.into(),
            }),
            raw: None,
        }
    }

    /// Source made of literal resources
    pub fn raw(name: impl Into<String>, resources: Vec<RawResource>) -> Self {
        Self {
            name: name.into(),
            profile: None,
            raw: Some(RawSource { resources }),
        }
    }

    /// Kind of this source, `None` when neither or both kinds are set.
    pub fn source_type(&self) -> Option<SourceType<'_>> {
        match (&self.profile, &self.raw) {
            (Some(profile), None) => Some(SourceType::Profile(profile)),
            (None, Some(raw)) => Some(SourceType::Raw(raw)),
            _ => None,
        }
    }
}

impl ProxyTemplateConf {
    /// Template made of a single profile source
    pub fn from_profile(profile: impl Into<String>) -> Self {
        let profile = profile.into();
        Self {
            sources: vec![ProxyTemplateSource::profile(profile.clone(), profile)],
        }
    }
}

impl ProxyTemplate {
    /// Stable `<name>.<namespace>` identity of this template
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.metadata)
    }

    /// Mesh this template belongs to
    pub fn mesh(&self) -> &str {
        &self.spec.mesh
    }
}
