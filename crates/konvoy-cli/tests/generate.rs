//! konvoyctl generate and validate against manifests on disk

use std::fs;
use std::path::{Path, PathBuf};

use rstest::rstest;
use serde_json::Value;

use konvoy_cli::commands::generate::{generate, GenerateArgs};
use konvoy_cli::commands::validate::check_templates;
use konvoy_cli::commands::{render, OutputFormat};
use konvoy_cli::input::read_manifests;
use konvoy_cli::Error;
use konvoy_common::crd::ProxyTemplate;
use konvoy_xds::generator::ProfileRegistry;

const DATAPLANE: &str = r#"
apiVersion: konvoy.io/v1alpha1
kind: Dataplane
metadata:
  name: backend-01
  namespace: demo
  resourceVersion: "42"
spec:
  networking:
    inbound:
      - interface: 192.168.0.1:80:8080
        tags:
          service: backend
    transparentProxying:
      redirectPort: 15001
"#;

const PERMISSIONS: &str = r#"
apiVersion: konvoy.io/v1alpha1
kind: TrafficPermission
metadata:
  name: web-to-backend
  namespace: demo
spec:
  rules:
    - sources:
        - match:
            service: web
      destinations:
        - match:
            service: backend
---
apiVersion: konvoy.io/v1alpha1
kind: TrafficPermission
metadata:
  name: web-to-cache
  namespace: demo
spec:
  rules:
    - sources:
        - match:
            service: web
      destinations:
        - match:
            service: cache
"#;

const TEMPLATE: &str = r#"
apiVersion: konvoy.io/v1alpha1
kind: ProxyTemplate
metadata:
  name: custom
  namespace: demo
spec:
  conf:
    sources:
      - name: defaults
        profile:
          name: default-proxy
      - name: admin
        raw:
          resources:
            - name: localhost:9901
              version: v1
              resource: |
                '@type': type.googleapis.com/envoy.api.v2.Cluster
                name: localhost:9901
                type: STATIC
                connectTimeout: 1s
"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn args(dataplane: PathBuf) -> GenerateArgs {
    GenerateArgs {
        dataplane,
        template: None,
        permissions: None,
        mtls: false,
        config: None,
        output: OutputFormat::Yaml,
    }
}

#[test]
fn story_generate_with_template_and_permissions() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = args(write(dir.path(), "dp.yaml", DATAPLANE));
    args.template = Some(write(dir.path(), "template.yaml", TEMPLATE));
    args.permissions = Some(write(dir.path(), "tp.yaml", PERMISSIONS));
    args.mtls = true;

    let resources = generate(&args).unwrap();
    assert_eq!(
        resources.names(),
        vec![
            "catch_all",
            "pass_through",
            "localhost:8080",
            "inbound:192.168.0.1:80",
            "localhost:9901",
        ]
    );

    let response = resources.to_discovery_response().unwrap();
    let policies = &response["resources"][3]["resource"]["filterChains"][0]["filters"][0]
        ["typedConfig"]["rules"]["policies"];
    let names: Vec<&String> = policies.as_object().unwrap().keys().collect();
    assert_eq!(names, vec!["web-to-backend.demo", "web-to-cache.demo"]);
    assert_eq!(response["resources"][0]["version"], "42");
    assert_eq!(response["resources"][4]["version"], "v1");
}

#[rstest]
#[case(OutputFormat::Yaml)]
#[case(OutputFormat::Json)]
fn rendered_output_parses_back(#[case] format: OutputFormat) {
    let dir = tempfile::tempdir().unwrap();
    let resources = generate(&args(write(dir.path(), "dp.yaml", DATAPLANE))).unwrap();
    let response = resources.to_discovery_response().unwrap();

    let rendered = render(&response, format).unwrap();
    let parsed: Value = match format {
        OutputFormat::Yaml => serde_yaml::from_str(&rendered).unwrap(),
        OutputFormat::Json => serde_json::from_str(&rendered).unwrap(),
    };
    assert_eq!(parsed, response);
}

#[test]
fn config_file_changes_timeouts() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = args(write(dir.path(), "dp.yaml", DATAPLANE));
    args.config = Some(write(dir.path(), "xds.yaml", "passThroughConnectTimeout: 30s\n"));

    let response = generate(&args).unwrap().to_discovery_response().unwrap();
    assert_eq!(response["resources"][1]["resource"]["connectTimeout"], "30s");
}

#[test]
fn missing_dataplane_names_path() {
    let err = generate(&args(PathBuf::from("/nonexistent/dp.yaml"))).unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
    assert!(err.to_string().contains("/nonexistent/dp.yaml"));
}

#[test]
fn malformed_dataplane_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let err = generate(&args(write(dir.path(), "dp.yaml", "spec: [not, a, map]\n"))).unwrap_err();
    assert!(matches!(err, Error::InvalidInput { kind: "Dataplane", .. }));
}

#[test]
fn template_error_surfaces_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let mut args = args(write(dir.path(), "dp.yaml", DATAPLANE));
    args.template = Some(write(
        dir.path(),
        "template.yaml",
        &TEMPLATE.replace("connectTimeout: 1s", "connectTimeout: 1m"),
    ));
    let err = generate(&args).unwrap_err();
    assert!(matches!(err, Error::Generate(_)));
    assert!(err
        .to_string()
        .starts_with("sources[1]{name=\"admin\"}: raw.resources[0]{name=\"localhost:9901\"}.resource: "));
    assert!(err.to_string().contains("invalid Cluster.ConnectTimeout"), "{err}");
}

#[test]
fn validate_accepts_good_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "template.yaml", TEMPLATE);
    let templates: Vec<ProxyTemplate> = read_manifests(&path, "ProxyTemplate").unwrap();
    assert_eq!(templates.len(), 1);
    assert!(check_templates(&templates, &ProfileRegistry::builtin()).is_empty());
}
