//! TrafficPermission to network RBAC compilation
//!
//! Each permission becomes one ALLOW policy scoped to the whole listener.
//! Access control is purely principal based: a policy admits the SPIFFE
//! identities named by the permission's own source selectors and nothing
//! else. An empty permission list yields a filter with no policies, which
//! denies every connection.

use std::collections::BTreeMap;

use tracing::trace;

use konvoy_common::crd::TrafficPermission;
use konvoy_common::mesh::trust_domain;

use crate::envoy::{Filter, Permission, Principal, Rbac, RbacAction, RbacPolicy, RbacRules};
use crate::error::GenerateError;

/// Compiles permissions into an RBAC filter for one listener
#[derive(Clone, Debug)]
pub struct RbacCompiler<'a> {
    service_tag_key: &'a str,
}

impl<'a> RbacCompiler<'a> {
    /// Compiler reading service identity from `service_tag_key`
    pub fn new(service_tag_key: &'a str) -> Self {
        Self { service_tag_key }
    }

    /// Build the RBAC filter for `listener_name`.
    ///
    /// Fails when a source selector lacks the service tag.
    pub fn compile(
        &self,
        listener_name: &str,
        permissions: &[TrafficPermission],
    ) -> Result<Filter, GenerateError> {
        let mut policies = BTreeMap::new();
        for permission in permissions {
            let name = permission.qualified_name();
            let policy = self.compile_policy(&name, permission)?;
            trace!(
                listener = listener_name,
                policy = %name,
                principals = policy.principals.len(),
                "compiled rbac policy"
            );
            policies.insert(name, policy);
        }

        Ok(Filter::rbac(Rbac {
            stat_prefix: listener_name.to_string(),
            rules: Some(RbacRules {
                action: RbacAction::Allow,
                policies,
                ..Default::default()
            }),
            ..Default::default()
        }))
    }

    fn compile_policy(
        &self,
        name: &str,
        permission: &TrafficPermission,
    ) -> Result<RbacPolicy, GenerateError> {
        let mut principals = Vec::new();
        for (rule_index, rule) in permission.spec.rules.iter().enumerate() {
            for (selector_index, selector) in rule.sources.iter().enumerate() {
                let service = selector.get(self.service_tag_key).ok_or_else(|| {
                    GenerateError::MissingTag {
                        permission: name.to_string(),
                        rule: rule_index,
                        selector: selector_index,
                        key: self.service_tag_key.to_string(),
                    }
                })?;
                principals.push(Principal::authenticated_exact(trust_domain::principal(
                    permission.mesh(),
                    service,
                )));
            }
        }
        Ok(RbacPolicy {
            permissions: vec![Permission::Any(true)],
            principals,
            ..Default::default()
        })
    }
}
