//! Dataplane CRD: the network topology of one proxy
//!
//! Inbound interfaces use the compact `<address>:<servicePort>:<workloadPort>`
//! form. The service port is where the proxy accepts traffic on behalf of the
//! workload; the workload port is where the workload itself listens on
//! localhost.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{default_mesh, qualified_name};
use crate::{Error, Result};

// =============================================================================
// CRD
// =============================================================================

/// Spec for a Dataplane: one sidecar proxy and the workload behind it
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "konvoy.io",
    version = "v1alpha1",
    kind = "Dataplane",
    plural = "dataplanes",
    shortname = "dp",
    namespaced,
    derive = "PartialEq",
    printcolumn = r#"{"name":"Mesh","type":"string","jsonPath":".spec.mesh"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DataplaneSpec {
    /// Mesh this dataplane belongs to
    #[serde(default = "default_mesh")]
    pub mesh: String,

    /// Network topology
    #[serde(default)]
    pub networking: Networking,
}

/// Network topology of a dataplane
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Networking {
    /// Interfaces on which the proxy accepts traffic for the workload
    #[serde(default)]
    pub inbound: Vec<Inbound>,

    /// Kernel-level traffic redirection, if enabled for this proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparent_proxying: Option<TransparentProxying>,
}

/// A declared inbound interface
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Inbound {
    /// `<address>:<servicePort>:<workloadPort>`
    pub interface: String,

    /// Tags describing the workload behind this interface (e.g. `service`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Transparent-proxying settings
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransparentProxying {
    /// Port that redirected traffic arrives on
    pub redirect_port: u32,
}

// =============================================================================
// Inbound interface
// =============================================================================

/// Parsed form of [`Inbound::interface`]
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InboundInterface {
    /// Address the proxy binds for this inbound
    pub address: String,
    /// Port the proxy binds for this inbound
    pub service_port: u32,
    /// Port the workload listens on at localhost
    pub workload_port: u32,
}

impl InboundInterface {
    /// Create an interface from its parts
    pub fn new(address: impl Into<String>, service_port: u32, workload_port: u32) -> Self {
        Self {
            address: address.into(),
            service_port,
            workload_port,
        }
    }
}

impl fmt::Display for InboundInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.address, self.service_port, self.workload_port
        )
    }
}

impl FromStr for InboundInterface {
    type Err = String;

    /// Ports are split off from the right so IPv6 addresses keep their colons.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let (Some(workload_port), Some(service_port), Some(address)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!(
                "invalid interface {:?}: expected <address>:<servicePort>:<workloadPort>",
                s
            ));
        };
        if address.is_empty() {
            return Err(format!("invalid interface {:?}: address is empty", s));
        }
        Ok(Self {
            address: address.to_string(),
            service_port: parse_port(s, "service port", service_port)?,
            workload_port: parse_port(s, "workload port", workload_port)?,
        })
    }
}

fn parse_port(interface: &str, what: &str, value: &str) -> std::result::Result<u32, String> {
    match value.parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(port),
        _ => Err(format!(
            "invalid interface {:?}: {} {:?} is not a port number",
            interface, what, value
        )),
    }
}

// =============================================================================
// Accessors
// =============================================================================

impl Dataplane {
    /// `<name>.<namespace>` identity used in logs and errors
    pub fn qualified_name(&self) -> String {
        qualified_name(&self.metadata)
    }

    /// Mesh this dataplane belongs to
    pub fn mesh(&self) -> &str {
        &self.spec.mesh
    }

    /// Store version of this dataplane, if it has been persisted
    pub fn version(&self) -> Option<&str> {
        self.metadata
            .resource_version
            .as_deref()
            .filter(|v| !v.is_empty())
    }

    /// Redirect port when transparent proxying is enabled
    pub fn redirect_port(&self) -> Option<u32> {
        self.spec
            .networking
            .transparent_proxying
            .map(|tp| tp.redirect_port)
    }

    /// Redirect port, rejecting values that are not TCP port numbers
    pub fn checked_redirect_port(&self) -> Result<Option<u32>> {
        match self.redirect_port() {
            Some(port) if !(1..=65535).contains(&port) => {
                let field = "networking.transparentProxying.redirectPort";
                Err(Error::validation_for_field(
                    self.qualified_name(),
                    field,
                    format!("{}: {} is not a port number", field, port),
                ))
            }
            port => Ok(port),
        }
    }

    /// Whether traffic reaches this proxy through kernel redirection
    pub fn is_transparent_proxying(&self) -> bool {
        self.redirect_port().is_some()
    }

    /// Parse every inbound interface, failing on the first malformed one.
    pub fn inbound_interfaces(&self) -> Result<Vec<InboundInterface>> {
        self.spec
            .networking
            .inbound
            .iter()
            .enumerate()
            .map(|(i, inbound)| {
                inbound.interface.parse().map_err(|msg: String| {
                    Error::validation_for_field(
                        self.qualified_name(),
                        format!("networking.inbound[{}].interface", i),
                        msg,
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn dataplane(interfaces: &[&str], redirect_port: Option<u32>) -> Dataplane {
        let mut dp = Dataplane::new(
            "web-01",
            DataplaneSpec {
                mesh: "default".to_string(),
                networking: Networking {
                    inbound: interfaces
                        .iter()
                        .map(|i| Inbound {
                            interface: i.to_string(),
                            tags: BTreeMap::new(),
                        })
                        .collect(),
                    transparent_proxying: redirect_port
                        .map(|redirect_port| TransparentProxying { redirect_port }),
                },
            },
        );
        dp.metadata.namespace = Some("demo".to_string());
        dp
    }

    #[rstest]
    #[case("192.168.0.1:80:8080", "192.168.0.1", 80, 8080)]
    #[case("10.0.0.2:443:8443", "10.0.0.2", 443, 8443)]
    #[case("fd00::1:80:8080", "fd00::1", 80, 8080)]
    fn parses_interface(
        #[case] input: &str,
        #[case] address: &str,
        #[case] service_port: u32,
        #[case] workload_port: u32,
    ) {
        let iface: InboundInterface = input.parse().unwrap();
        assert_eq!(
            iface,
            InboundInterface::new(address, service_port, workload_port)
        );
        assert_eq!(iface.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("192.168.0.1:80")]
    #[case(":80:8080")]
    #[case("192.168.0.1:http:8080")]
    #[case("192.168.0.1:80:0")]
    #[case("192.168.0.1:80:70000")]
    fn rejects_malformed_interface(#[case] input: &str) {
        let err = input.parse::<InboundInterface>().unwrap_err();
        assert!(err.contains("invalid interface"), "{err}");
    }

    #[test]
    fn story_inbound_interfaces_report_field_path() {
        let dp = dataplane(&["192.168.0.1:80:8080", "bogus"], None);
        let err = dp.inbound_interfaces().unwrap_err();
        assert_eq!(err.resource(), Some("web-01.demo"));
        assert_eq!(err.field(), Some("networking.inbound[1].interface"));
    }

    #[test]
    fn story_transparent_proxying_accessors() {
        let plain = dataplane(&["192.168.0.1:80:8080"], None);
        assert!(!plain.is_transparent_proxying());
        assert_eq!(plain.redirect_port(), None);

        let redirected = dataplane(&["192.168.0.1:80:8080"], Some(15001));
        assert!(redirected.is_transparent_proxying());
        assert_eq!(redirected.redirect_port(), Some(15001));
    }

    #[rstest]
    #[case(0)]
    #[case(65536)]
    #[case(70000)]
    fn rejects_out_of_range_redirect_port(#[case] port: u32) {
        let dp = dataplane(&[], Some(port));
        let err = dp.checked_redirect_port().unwrap_err();
        assert_eq!(err.resource(), Some("web-01.demo"));
        assert_eq!(err.field(), Some("networking.transparentProxying.redirectPort"));
    }

    #[test]
    fn checked_redirect_port_passes_valid_values() {
        assert_eq!(dataplane(&[], None).checked_redirect_port().unwrap(), None);
        assert_eq!(
            dataplane(&[], Some(65535)).checked_redirect_port().unwrap(),
            Some(65535)
        );
    }

    #[test]
    fn story_version_ignores_empty_resource_version() {
        let mut dp = dataplane(&[], None);
        assert_eq!(dp.version(), None);
        dp.metadata.resource_version = Some(String::new());
        assert_eq!(dp.version(), None);
        dp.metadata.resource_version = Some("v1".to_string());
        assert_eq!(dp.version(), Some("v1"));
    }

    #[test]
    fn story_dataplane_from_yaml_defaults_mesh() {
        let dp: Dataplane = serde_yaml::from_str(
            r#"
apiVersion: konvoy.io/v1alpha1
kind: Dataplane
metadata:
  name: web-01
  namespace: demo
spec:
  networking:
    inbound:
      - interface: 192.168.0.1:80:8080
        tags:
          service: web
    transparentProxying:
      redirectPort: 15001
"#,
        )
        .unwrap();
        assert_eq!(dp.mesh(), "default");
        assert_eq!(dp.redirect_port(), Some(15001));
        assert_eq!(dp.spec.networking.inbound[0].tags["service"], "web");
    }
}
