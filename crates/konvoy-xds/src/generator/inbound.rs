//! Inbound topology: one local cluster and one listener per interface

use std::collections::BTreeSet;

use tracing::trace;

use konvoy_common::mesh::{inbound_listener_name, local_cluster_name};

use super::ResourceGenerator;
use crate::context::Context;
use crate::envoy::{Cluster, Filter, Listener};
use crate::error::GenerateError;
use crate::model::Proxy;
use crate::rbac::RbacCompiler;
use crate::resource::{Resource, ResourceSet};

/// Builds `localhost:<workloadPort>` clusters and `inbound:<address>:<servicePort>`
/// listeners from a dataplane's inbound interfaces.
///
/// Interfaces sharing a workload port share one cluster. When the mesh has
/// mTLS enabled, each listener gets an RBAC filter ahead of its TCP proxy.
#[derive(Clone, Copy, Debug, Default)]
pub struct InboundProxyGenerator;

impl InboundProxyGenerator {
    /// Stage name
    pub const NAME: &'static str = "inbound-proxy";
}

impl ResourceGenerator for InboundProxyGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate(&self, ctx: &Context, proxy: &Proxy) -> Result<ResourceSet, GenerateError> {
        let dataplane = &proxy.dataplane;
        let interfaces = dataplane
            .inbound_interfaces()
            .map_err(|source| GenerateError::Dataplane {
                dataplane: proxy.id.name.clone(),
                source,
            })?;
        let version = proxy.version();
        let transparent = dataplane.is_transparent_proxying();
        let rbac = RbacCompiler::new(&ctx.config.service_tag_key);

        let mut resources = ResourceSet::new();
        let mut local_ports = BTreeSet::new();
        for interface in &interfaces {
            let cluster_name = local_cluster_name(interface.workload_port);
            if local_ports.insert(interface.workload_port) {
                let cluster = Cluster::local(
                    cluster_name.clone(),
                    interface.workload_port,
                    ctx.config.local_cluster_connect_timeout.clone(),
                );
                resources.push(Resource::versioned(cluster_name.clone(), version, cluster)?);
            }

            let listener_name = inbound_listener_name(&interface.address, interface.service_port);
            let mut filters = Vec::with_capacity(2);
            if ctx.mesh.mtls_enabled {
                filters.push(rbac.compile(&listener_name, proxy.permissions_for(interface))?);
            }
            filters.push(Filter::tcp_proxy(cluster_name));

            let mut listener = Listener::new(
                listener_name.clone(),
                interface.address.clone(),
                interface.service_port,
                filters,
            );
            if transparent {
                listener = listener.without_binding();
            }
            trace!(proxy = %proxy.id, listener = %listener_name, "built inbound listener");
            resources.push(Resource::versioned(listener_name, version, listener)?);
        }
        Ok(resources)
    }
}
