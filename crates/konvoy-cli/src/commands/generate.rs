//! Generate command

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use tracing::{info, warn};

use konvoy_common::config::XdsConfig;
use konvoy_common::crd::{Dataplane, ProxyTemplate, TrafficPermission};
use konvoy_xds::generator::ProfileRegistry;
use konvoy_xds::{MeshContext, Proxy, ProxyCompiler, ResourceSet};

use super::{print, OutputFormat};
use crate::input::{permissions_for_inbounds, read_manifest, read_manifests};
use crate::Result;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Dataplane manifest
    #[arg(long, short = 'd')]
    pub dataplane: PathBuf,

    /// ProxyTemplate manifests (one or more YAML documents)
    #[arg(long, short = 't')]
    pub template: Option<PathBuf>,

    /// TrafficPermission manifests already selected for this dataplane
    #[arg(long, short = 'p')]
    pub permissions: Option<PathBuf>,

    /// Enable mutual TLS for the mesh, which turns on RBAC enforcement
    #[arg(long)]
    pub mtls: bool,

    /// Compiler settings file; falls back to $KONVOY_XDS_CONFIG
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,
}

pub fn run(args: GenerateArgs) -> Result<()> {
    let resources = generate(&args)?;
    print(&resources.to_discovery_response()?, args.output)
}

/// Load every input named by `args` and compile the dataplane.
pub fn generate(args: &GenerateArgs) -> Result<ResourceSet> {
    let config = XdsConfig::load(args.config.as_deref())?;
    let dataplane: Dataplane = read_manifest(&args.dataplane, "Dataplane")?;
    let templates: Vec<ProxyTemplate> = match &args.template {
        Some(path) => read_manifests(path, "ProxyTemplate")?,
        None => Vec::new(),
    };
    let permissions: Vec<TrafficPermission> = match &args.permissions {
        Some(path) => read_manifests(path, "TrafficPermission")?,
        None => Vec::new(),
    };
    if !permissions.is_empty() && !args.mtls {
        warn!("traffic permissions are only enforced with --mtls");
    }

    let traffic_permissions = permissions_for_inbounds(&dataplane, &permissions)?;
    let mesh = MeshContext::new(dataplane.mesh(), args.mtls);
    let proxy = Proxy::new(dataplane).with_traffic_permissions(traffic_permissions);

    let compiler = ProxyCompiler::new(Arc::new(ProfileRegistry::builtin()), config);
    let resources = compiler.compile(mesh, &proxy, &templates)?;
    info!(proxy = %proxy.id, resources = resources.len(), "generated resources");
    Ok(resources)
}
