//! Proxy configuration compiler settings
//!
//! Settings are read from a YAML file. The path resolution chain (highest
//! priority first):
//! 1. Explicit path (e.g. the `--config` CLI flag)
//! 2. `KONVOY_XDS_CONFIG` environment variable
//! 3. Built-in defaults
//!
//! Every field has a default, so a partial file only overrides what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::mesh;
use crate::{Error, Result};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "KONVOY_XDS_CONFIG";

const DEFAULT_CONNECT_TIMEOUT: &str = "5s";

/// Settings consumed by the generators.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct XdsConfig {
    /// Profile used when no ProxyTemplate applies to a dataplane
    pub default_profile: String,
    /// Connect timeout of the `localhost:<port>` clusters
    pub local_cluster_connect_timeout: String,
    /// Connect timeout of the `pass_through` cluster
    pub pass_through_connect_timeout: String,
    /// Tag key holding a workload's service identity in policy selectors
    pub service_tag_key: String,
}

impl Default for XdsConfig {
    fn default() -> Self {
        Self {
            default_profile: mesh::PROFILE_DEFAULT_PROXY.to_string(),
            local_cluster_connect_timeout: DEFAULT_CONNECT_TIMEOUT.to_string(),
            pass_through_connect_timeout: DEFAULT_CONNECT_TIMEOUT.to_string(),
            service_tag_key: mesh::SERVICE_TAG.to_string(),
        }
    }
}

impl XdsConfig {
    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(input: &str) -> Result<Self> {
        let config: XdsConfig = serde_yaml::from_str(input)
            .map_err(|e| Error::serialization_for_kind("XdsConfig", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&data)
    }

    /// Load configuration using the resolution chain.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit) {
            Some(path) => {
                debug!(path = %path.display(), "loading xds config");
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Check that every setting is usable by the generators.
    pub fn validate(&self) -> Result<()> {
        if self.default_profile.is_empty() {
            return Err(Error::config_for_key("defaultProfile", "must not be empty"));
        }
        if self.service_tag_key.is_empty() {
            return Err(Error::config_for_key("serviceTagKey", "must not be empty"));
        }
        validate_duration("localClusterConnectTimeout", &self.local_cluster_connect_timeout)?;
        validate_duration("passThroughConnectTimeout", &self.pass_through_connect_timeout)?;
        Ok(())
    }
}

/// Resolve the configuration file path, `None` meaning built-in defaults.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => None,
    }
}

/// Seconds in a proto3 JSON duration such as `5s` or `0.25s`.
///
/// `None` unless the text is plain decimal digits, an optional fraction and
/// an `s` suffix; signs, exponents and `inf`/`NaN` are not durations.
pub fn duration_seconds(value: &str) -> Option<f64> {
    let number = value.strip_suffix('s')?;
    let (whole, fraction) = number.split_once('.').unwrap_or((number, "0"));
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || !digits(fraction) {
        return None;
    }
    number.parse().ok()
}

fn validate_duration(key: &str, value: &str) -> Result<()> {
    match duration_seconds(value) {
        Some(seconds) if seconds > 0.0 => Ok(()),
        Some(_) => Err(Error::config_for_key(
            key,
            format!("{:?} must be a positive duration", value),
        )),
        None => Err(Error::config_for_key(
            key,
            format!("{:?} is not a duration in seconds, e.g. \"5s\"", value),
        )),
    }
}
