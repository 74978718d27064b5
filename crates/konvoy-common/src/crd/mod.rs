//! Custom Resource Definitions for the Konvoy mesh API
//!
//! These are the declarative inputs of the proxy configuration compiler.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

mod dataplane;
mod proxy_template;
mod traffic_permission;

pub use dataplane::{
    Dataplane, DataplaneSpec, Inbound, InboundInterface, Networking, TransparentProxying,
};
pub use proxy_template::{
    ProfileSource, ProxyTemplate, ProxyTemplateConf, ProxyTemplateSource, ProxyTemplateSpec,
    RawResource, RawSource, SourceType,
};
pub use traffic_permission::{PermissionRule, Selector, TrafficPermission, TrafficPermissionSpec};

const DEFAULT_NAMESPACE: &str = "default";

pub(crate) fn default_mesh() -> String {
    crate::DEFAULT_MESH.to_string()
}

/// `<name>.<namespace>` identity of a namespaced object, used in error
/// messages and as the stable key of compiled policies.
pub(crate) fn qualified_name(meta: &ObjectMeta) -> String {
    format!(
        "{}.{}",
        meta.name.as_deref().unwrap_or_default(),
        meta.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE)
    )
}
