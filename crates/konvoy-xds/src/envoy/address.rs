//! Network addresses

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::validate::{embedded, min_len, Validate, ValidationError};

/// Network address
///
/// Only socket addresses are typed; the other `oneof` members (pipes) are
/// carried in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// TCP socket address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_address: Option<SocketAddress>,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// IP address and port
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketAddress {
    /// IP address to bind or connect to
    #[serde(default)]
    pub address: String,
    /// TCP port
    #[serde(default)]
    pub port_value: u32,
    /// Fields without a typed model, kept verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Address {
    /// Socket address at `address:port`
    pub fn socket(address: impl Into<String>, port: u32) -> Self {
        Self {
            socket_address: Some(SocketAddress {
                address: address.into(),
                port_value: port,
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

impl Validate for Address {
    fn validate(&self) -> Result<(), ValidationError> {
        match &self.socket_address {
            Some(socket) => embedded("Address", "SocketAddress", socket),
            None if self.extra.is_empty() => Err(ValidationError::new(
                "Address",
                "Address",
                "value is required",
            )),
            None => Ok(()),
        }
    }
}

impl Validate for SocketAddress {
    fn validate(&self) -> Result<(), ValidationError> {
        min_len("SocketAddress", "Address", &self.address)?;
        if self.port_value > 65535 {
            return Err(ValidationError::new(
                "SocketAddress",
                "PortValue",
                "value must be less than or equal to 65535",
            ));
        }
        Ok(())
    }
}
