//! Manifest loading
//!
//! The compiler expects permissions already selected for the proxy. The CLI
//! has no selection logic: whatever permissions it is given are treated as
//! applying to every inbound interface of the dataplane.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use konvoy_common::crd::{Dataplane, TrafficPermission};
use konvoy_xds::TrafficPermissionMap;

use crate::{Error, Result};

/// Read a single-document manifest
pub fn read_manifest<T: DeserializeOwned>(path: &Path, kind: &'static str) -> Result<T> {
    let content = read(path)?;
    serde_yaml::from_str(&content).map_err(|e| Error::InvalidInput {
        kind,
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read every document of a multi-document manifest, skipping empty ones
pub fn read_manifests<T: DeserializeOwned>(path: &Path, kind: &'static str) -> Result<Vec<T>> {
    let content = read(path)?;
    let mut items = Vec::new();
    for document in serde_yaml::Deserializer::from_str(&content) {
        let value = serde_yaml::Value::deserialize(document).map_err(|e| Error::InvalidInput {
            kind,
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if value.is_null() {
            continue;
        }
        items.push(serde_yaml::from_value(value).map_err(|e| Error::InvalidInput {
            kind,
            path: path.to_path_buf(),
            message: e.to_string(),
        })?);
    }
    Ok(items)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Apply `permissions` to every inbound interface of `dataplane`.
pub fn permissions_for_inbounds(
    dataplane: &Dataplane,
    permissions: &[TrafficPermission],
) -> Result<TrafficPermissionMap> {
    let interfaces = dataplane.inbound_interfaces()?;
    debug!(
        interfaces = interfaces.len(),
        permissions = permissions.len(),
        "applying permissions to inbounds"
    );
    Ok(interfaces
        .into_iter()
        .map(|interface| (interface, permissions.to_vec()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use konvoy_common::crd::InboundInterface;

    fn dataplane() -> Dataplane {
        serde_yaml::from_str(
            r#"
apiVersion: konvoy.io/v1alpha1
kind: Dataplane
metadata:
  name: backend-01
  namespace: demo
spec:
  networking:
    inbound:
      - interface: 192.168.0.1:80:8080
        tags:
          service: backend
      - interface: 192.168.0.1:9090:9090
        tags:
          service: metrics
"#,
        )
        .unwrap()
    }

    fn permission(name: &str) -> TrafficPermission {
        serde_yaml::from_str(&format!(
            r#"
apiVersion: konvoy.io/v1alpha1
kind: TrafficPermission
metadata:
  name: {name}
  namespace: demo
spec:
  rules:
    - sources:
        - match:
            service: web
      destinations:
        - match:
            service: backend
"#
        ))
        .unwrap()
    }

    #[test]
    fn story_every_inbound_gets_every_permission() {
        let map =
            permissions_for_inbounds(&dataplane(), &[permission("a"), permission("b")]).unwrap();

        assert_eq!(map.len(), 2);
        for iface in [
            InboundInterface::new("192.168.0.1", 80, 8080),
            InboundInterface::new("192.168.0.1", 9090, 9090),
        ] {
            let names: Vec<String> = map[&iface].iter().map(|tp| tp.qualified_name()).collect();
            assert_eq!(names, vec!["a.demo", "b.demo"]);
        }
    }

    #[test]
    fn read_manifests_skips_empty_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tp.yaml");
        let tp = serde_yaml::to_string(&permission("a")).unwrap();
        std::fs::write(&path, format!("---\n{tp}---\n---\n{tp}")).unwrap();

        let items: Vec<TrafficPermission> = read_manifests(&path, "TrafficPermission").unwrap();
        assert_eq!(items.len(), 2);
    }
}
