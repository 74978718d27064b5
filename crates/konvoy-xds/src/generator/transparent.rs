//! Catch-all listener and original-destination cluster for redirected traffic

use konvoy_common::mesh::{ANY_ADDRESS, CATCH_ALL_LISTENER, PASS_THROUGH_CLUSTER};

use super::ResourceGenerator;
use crate::context::Context;
use crate::envoy::{Cluster, Filter, Listener};
use crate::error::GenerateError;
use crate::model::Proxy;
use crate::resource::{Resource, ResourceSet};

/// Emits `catch_all` and `pass_through` when the dataplane declares a
/// redirect port, and nothing otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransparentProxyGenerator;

impl TransparentProxyGenerator {
    /// Stage name
    pub const NAME: &'static str = "transparent-proxy";
}

impl ResourceGenerator for TransparentProxyGenerator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate(&self, ctx: &Context, proxy: &Proxy) -> Result<ResourceSet, GenerateError> {
        let redirect_port = proxy
            .dataplane
            .checked_redirect_port()
            .map_err(|source| GenerateError::Dataplane {
                dataplane: proxy.id.name.clone(),
                source,
            })?;
        let Some(redirect_port) = redirect_port else {
            return Ok(ResourceSet::new());
        };
        let version = proxy.version();

        let mut listener = Listener::new(
            CATCH_ALL_LISTENER,
            ANY_ADDRESS,
            redirect_port,
            vec![Filter::tcp_proxy(PASS_THROUGH_CLUSTER)],
        );
        listener.use_original_dst = Some(true);
        let cluster = Cluster::original_destination(
            PASS_THROUGH_CLUSTER,
            ctx.config.pass_through_connect_timeout.clone(),
        );

        let mut resources = ResourceSet::new();
        resources.push(Resource::versioned(CATCH_ALL_LISTENER, version, listener)?);
        resources.push(Resource::versioned(PASS_THROUGH_CLUSTER, version, cluster)?);
        Ok(resources)
    }
}
