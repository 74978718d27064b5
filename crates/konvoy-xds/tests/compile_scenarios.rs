//! End-to-end compilation stories
//!
//! Each test builds declarative mesh state the way an operator would write
//! it (YAML manifests) and checks the resource set a proxy would receive.

use std::collections::BTreeMap;
use std::sync::Arc;

use rstest::rstest;
use serde_json::{json, Value};

use konvoy_common::config::XdsConfig;
use konvoy_common::crd::{Dataplane, InboundInterface, ProxyTemplate, TrafficPermission};
use konvoy_xds::envoy::{FilterConfig, Listener, ResourceKind, WireObject};
use konvoy_xds::generator::{ProfileRegistry, TemplateGenerator};
use konvoy_xds::{
    CompositeGenerator, Context, GenerateError, MeshContext, Proxy, ProxyCompiler, Resource,
    ResourceGenerator, ResourceSet,
};

fn dataplane(yaml: &str) -> Dataplane {
    serde_yaml::from_str(yaml).unwrap()
}

fn web(transparent: bool) -> Dataplane {
    let mut yaml = String::from(
        r#"
apiVersion: konvoy.io/v1alpha1
kind: Dataplane
metadata:
  name: web-01
  namespace: demo
  resourceVersion: "1"
spec:
  mesh: default
  networking:
    inbound:
      - interface: 192.168.0.1:80:8080
        tags:
          service: web
"#,
    );
    if transparent {
        yaml.push_str("    transparentProxying:\n      redirectPort: 15001\n");
    }
    dataplane(&yaml)
}

fn compiler() -> ProxyCompiler {
    ProxyCompiler::new(Arc::new(ProfileRegistry::builtin()), XdsConfig::default())
}

fn compile(dp: Dataplane) -> ResourceSet {
    compiler()
        .compile(MeshContext::new("default", false), &Proxy::new(dp), &[])
        .unwrap()
}

fn listener(set: &ResourceSet, name: &str) -> Listener {
    match &set.get(name).unwrap().payload {
        WireObject::Listener(l) => l.clone(),
        other => panic!("expected listener, got {other:?}"),
    }
}

fn payload_json(resource: &Resource) -> Value {
    resource.payload.to_json().unwrap()
}

// =============================================================================
// Topology
// =============================================================================

#[test]
fn story_scenario_a_plain_inbound() {
    let set = compile(web(false));

    assert_eq!(set.names(), vec!["localhost:8080", "inbound:192.168.0.1:80"]);
    assert!(set.iter().all(|r| r.version == "1"));

    assert_eq!(
        payload_json(set.get("localhost:8080").unwrap()),
        json!({
            "@type": "type.googleapis.com/envoy.api.v2.Cluster",
            "name": "localhost:8080",
            "type": "STATIC",
            "connectTimeout": "5s",
            "loadAssignment": {
                "clusterName": "localhost:8080",
                "endpoints": [{"lbEndpoints": [{"endpoint": {"address": {
                    "socketAddress": {"address": "127.0.0.1", "portValue": 8080}
                }}}]}]
            }
        })
    );
    assert_eq!(
        payload_json(set.get("inbound:192.168.0.1:80").unwrap()),
        json!({
            "@type": "type.googleapis.com/envoy.api.v2.Listener",
            "name": "inbound:192.168.0.1:80",
            "address": {"socketAddress": {"address": "192.168.0.1", "portValue": 80}},
            "filterChains": [{"filters": [{
                "name": "envoy.tcp_proxy",
                "typedConfig": {
                    "@type": "type.googleapis.com/envoy.config.filter.network.tcp_proxy.v2.TcpProxy",
                    "statPrefix": "localhost:8080",
                    "cluster": "localhost:8080",
                }
            }]}]
        })
    );
}

#[test]
fn story_scenario_b_transparent_proxying() {
    let set = compile(web(true));

    assert_eq!(
        set.names(),
        vec!["catch_all", "pass_through", "localhost:8080", "inbound:192.168.0.1:80"]
    );
    assert!(!listener(&set, "inbound:192.168.0.1:80").binds_to_port());
}

#[test]
fn transparent_proxying_only_changes_binding_and_catch_all() {
    let plain = compile(web(false));
    let transparent = compile(web(true));

    assert_eq!(plain.get("localhost:8080"), transparent.get("localhost:8080"));

    let mut redirected = listener(&transparent, "inbound:192.168.0.1:80");
    redirected.deprecated_v1 = None;
    assert_eq!(redirected, listener(&plain, "inbound:192.168.0.1:80"));

    for name in ["catch_all", "pass_through"] {
        assert!(plain.get(name).is_none());
        assert!(transparent.get(name).is_some());
    }
}

#[test]
fn redirect_port_outside_tcp_range_fails_compilation() {
    let mut dp = web(true);
    if let Some(tp) = dp.spec.networking.transparent_proxying.as_mut() {
        tp.redirect_port = 70000;
    }
    let err = compiler()
        .compile(MeshContext::new("default", false), &Proxy::new(dp), &[])
        .unwrap_err();
    assert!(err.is_configuration_error());
    assert!(
        err.to_string()
            .contains("networking.transparentProxying.redirectPort: 70000 is not a port number"),
        "{err}"
    );
}

#[test]
fn shared_workload_port_collapses_to_one_cluster() {
    let set = compile(dataplane(
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
      - interface: 192.168.0.2:80:8080
      - interface: 192.168.0.1:81:8080
"#,
    ));
    let clusters: Vec<_> = set.of_kind(ResourceKind::Cluster).map(|r| r.name.as_str()).collect();
    assert_eq!(clusters, vec!["localhost:8080"]);
    assert_eq!(set.of_kind(ResourceKind::Listener).count(), 3);
}

#[test]
fn unpersisted_dataplane_is_versioned_by_content() {
    let mut dp = web(false);
    dp.metadata.resource_version = None;
    let first = compile(dp.clone());
    let second = compile(dp);
    assert_eq!(first, second);
    assert!(first.iter().all(|r| r.version.len() == 16));
}

// =============================================================================
// Templates
// =============================================================================

const RAW_CLUSTER: &str = r#"
'@type': type.googleapis.com/envoy.api.v2.Cluster
name: localhost:8443
type: STATIC
connectTimeout: 5s
loadAssignment:
  clusterName: localhost:8443
  endpoints:
  - lbEndpoints:
    - endpoint:
        address:
          socketAddress:
            address: 127.0.0.1
            portValue: 8443
"#;

/// ProxyTemplate with the default profile followed by one raw resource.
fn template(raw_resource: &str) -> ProxyTemplate {
    template_named("raw-name", raw_resource)
}

fn template_named(raw_name: &str, raw_resource: &str) -> ProxyTemplate {
    let yaml = format!(
        r#"
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
      - name: extra
        raw:
          resources:
            - name: {}
              version: raw-version
              resource: {}
"#,
        serde_json::to_string(raw_name).unwrap(),
        serde_json::to_string(raw_resource).unwrap()
    );
    serde_yaml::from_str(&yaml).unwrap()
}

#[test]
fn story_raw_source_round_trips() {
    let set = compiler()
        .compile(
            MeshContext::new("default", false),
            &Proxy::new(web(false)),
            &[template(RAW_CLUSTER)],
        )
        .unwrap();

    assert_eq!(
        set.names(),
        vec!["localhost:8080", "inbound:192.168.0.1:80", "raw-name"]
    );
    let raw = set.get("raw-name").unwrap();
    assert_eq!(raw.version, "raw-version");

    let expected: Value = serde_yaml::from_str(RAW_CLUSTER).unwrap();
    assert_eq!(payload_json(raw), expected);
}

const RAW_HTTP_LISTENER: &str = r#"
'@type': type.googleapis.com/envoy.api.v2.Listener
name: inbound:0.0.0.0:8080
address:
  socketAddress:
    address: 0.0.0.0
    portValue: 8080
filterChains:
  - filters:
      - name: envoy.http_connection_manager
        typedConfig:
          '@type': type.googleapis.com/envoy.config.filter.network.http_connection_manager.v2.HttpConnectionManager
          statPrefix: ingress_http
          routeConfig:
            name: local_route
          httpFilters:
            - name: envoy.router
"#;

const RAW_HTTP2_CLUSTER: &str = r#"
'@type': type.googleapis.com/envoy.api.v2.Cluster
name: grpc-backend
type: STRICT_DNS
connectTimeout: 1s
http2ProtocolOptions: {}
"#;

#[rstest]
#[case::http_connection_manager(RAW_HTTP_LISTENER)]
#[case::http2_cluster(RAW_HTTP2_CLUSTER)]
fn hand_written_raw_resources_pass_through(#[case] payload: &str) {
    let set = compiler()
        .compile(
            MeshContext::new("default", false),
            &Proxy::new(web(false)),
            &[template(payload)],
        )
        .unwrap();

    let expected: Value = serde_yaml::from_str(payload).unwrap();
    assert_eq!(payload_json(set.get("raw-name").unwrap()), expected);
}

#[test]
fn raw_resource_may_collide_with_generated_names() {
    let set = compiler()
        .compile(
            MeshContext::new("default", false),
            &Proxy::new(web(false)),
            &[template_named("localhost:8080", RAW_HTTP2_CLUSTER)],
        )
        .unwrap();

    assert_eq!(
        set.names(),
        vec!["localhost:8080", "inbound:192.168.0.1:80", "localhost:8080"]
    );
    assert_eq!(
        set.duplicate_names(),
        vec![(ResourceKind::Cluster, "localhost:8080".to_string())]
    );
}

#[rstest]
#[case::empty_body("")]
#[case::truncated_json(r#"{"@type": "type.googleapis.com/envoy.api.v2.Cluster", "name":"#)]
#[case::unknown_type("'@type': type.googleapis.com/envoy.api.v2.Secret\nname: cert")]
#[case::not_a_resource("'@type': type.googleapis.com/envoy.config.filter.network.rbac.v2.RBAC\nstatPrefix: x")]
#[case::missing_name("'@type': type.googleapis.com/envoy.api.v2.Cluster\ntype: STATIC")]
#[case::mistyped_field("'@type': type.googleapis.com/envoy.api.v2.Cluster\nname: a\nconnectTimeout: [5]")]
fn malformed_raw_resource_fails_with_path(#[case] payload: &str) {
    let err = compiler()
        .compile(
            MeshContext::new("default", false),
            &Proxy::new(web(false)),
            &[template(payload)],
        )
        .unwrap_err();
    let message = err.to_string();
    assert!(
        message.contains("raw.resources[0]{name=\"raw-name\"}.resource:"),
        "{message}"
    );
    assert!(message.starts_with("sources[1]{name=\"extra\"}: "), "{message}");
    assert!(err.is_configuration_error());
}

#[test]
fn unknown_profile_in_template() {
    let mut t = template(RAW_CLUSTER);
    t.spec.conf.sources[0].profile.as_mut().unwrap().name = "mystery".to_string();
    let err = compiler()
        .compile(MeshContext::new("default", false), &Proxy::new(web(false)), &[t])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "sources[0]{name=\"defaults\"}: unknown profile: mystery"
    );
}

#[test]
fn template_in_another_mesh_is_ignored() {
    let mut t = template(RAW_CLUSTER);
    t.spec.mesh = "other".to_string();
    let set = compiler()
        .compile(MeshContext::new("default", false), &Proxy::new(web(false)), &[t])
        .unwrap();
    assert!(set.get("raw-name").is_none());
}

// =============================================================================
// Composition
// =============================================================================

struct Broken;

impl ResourceGenerator for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn generate(&self, _: &Context, _: &Proxy) -> Result<ResourceSet, GenerateError> {
        Err(GenerateError::internal("backing store unavailable"))
    }
}

#[test]
fn composite_discards_partial_output() {
    let registry = ProfileRegistry::builtin();
    let composite = CompositeGenerator::new(
        "pipeline",
        vec![registry.get("default-proxy").unwrap(), Arc::new(Broken)],
    );
    let result = composite.generate(&Context::default(), &Proxy::new(web(true)));
    let err = result.err().unwrap();
    assert_eq!(
        err.to_string(),
        "generator[1] broken: backing store unavailable"
    );
    assert!(!err.is_configuration_error());
}

#[test]
fn custom_profiles_resolve_from_templates() {
    let registry = Arc::new(
        ProfileRegistry::builtin().with_profile("broken", Arc::new(Broken)),
    );
    let mut t = template(RAW_CLUSTER);
    t.spec.conf.sources[0].profile.as_mut().unwrap().name = "broken".to_string();
    let generator = TemplateGenerator::new("custom", t.spec.conf, registry);
    let err = generator
        .generate(&Context::default(), &Proxy::new(web(false)))
        .err()
        .unwrap();
    assert!(err.to_string().starts_with("sources[0]{name=\"defaults\"}: "));
}

// =============================================================================
// Security policy
// =============================================================================

fn permission(yaml: &str) -> TrafficPermission {
    serde_yaml::from_str(yaml).unwrap()
}

fn permissions() -> Vec<TrafficPermission> {
    vec![
        permission(
            r#"
apiVersion: konvoy.io/v1alpha1
kind: TrafficPermission
metadata:
  name: tp-1
  namespace: demo
spec:
  rules:
    - sources:
        - match:
            service: web1
      destinations:
        - match:
            service: backend
"#,
        ),
        permission(
            r#"
apiVersion: konvoy.io/v1alpha1
kind: TrafficPermission
metadata:
  name: tp-2
  namespace: demo
spec:
  rules:
    - sources:
        - match:
            service: web2
      destinations:
        - match:
            service: backend
"#,
        ),
    ]
}

fn rbac_policies(set: &ResourceSet) -> Value {
    let listener = listener(set, "inbound:192.168.0.1:80");
    let first = listener.filters().next().unwrap();
    assert_eq!(first.name, "envoy.filters.network.rbac");
    match &first.typed_config {
        Some(config @ FilterConfig::Rbac(_)) => serde_json::to_value(config).unwrap()["rules"]["policies"].clone(),
        other => panic!("expected rbac, got {other:?}"),
    }
}

#[test]
fn story_rbac_policies_stay_isolated() {
    let mut map = BTreeMap::new();
    map.insert(InboundInterface::new("192.168.0.1", 80, 8080), permissions());
    let proxy = Proxy::new(web(false)).with_traffic_permissions(map);

    let set = compiler()
        .compile(MeshContext::new("default", true), &proxy, &[])
        .unwrap();

    assert_eq!(
        rbac_policies(&set),
        json!({
            "tp-1.demo": {
                "permissions": [{"any": true}],
                "principals": [{"authenticated": {"principalName": {"exact": "spiffe://default/web1"}}}]
            },
            "tp-2.demo": {
                "permissions": [{"any": true}],
                "principals": [{"authenticated": {"principalName": {"exact": "spiffe://default/web2"}}}]
            }
        })
    );
}

#[test]
fn mtls_without_permissions_denies_everything() {
    let set = compiler()
        .compile(MeshContext::new("default", true), &Proxy::new(web(false)), &[])
        .unwrap();
    assert_eq!(rbac_policies(&set), json!({}));
}

#[test]
fn selector_without_service_tag_is_rejected() {
    let mut tps = permissions();
    tps[1].spec.rules[0].sources[0].match_.clear();
    let mut map = BTreeMap::new();
    map.insert(InboundInterface::new("192.168.0.1", 80, 8080), tps);
    let proxy = Proxy::new(web(false)).with_traffic_permissions(map);

    let err = compiler()
        .compile(MeshContext::new("default", true), &proxy, &[])
        .unwrap_err();
    assert!(err.to_string().contains("tp-2.demo"), "{err}");
    assert!(err.is_configuration_error());
}

#[test]
fn compiler_is_shareable_across_threads() {
    let compiler = compiler();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let set = compiler
                    .compile(MeshContext::new("default", false), &Proxy::new(web(true)), &[])
                    .unwrap();
                assert_eq!(set.len(), 4);
            });
        }
    });
}
