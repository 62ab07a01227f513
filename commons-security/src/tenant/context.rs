//! Request-scoped tenant context.

use super::organization::{Organization, OrganizationId};
use crate::error::{Result, SecurityError};
use serde::Serialize;
use std::sync::Arc;

/// How the tenant was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantSource {
    /// `<subdomain>.<base_domain>`
    Subdomain,
    /// A verified custom domain.
    CustomDomain,
    /// Named by a super-admin on a platform host.
    Impersonation,
}

/// The organization a single request is bound to.
///
/// Built once by the resolver and never modified; cloning shares the
/// underlying organization snapshot.
#[derive(Debug, Clone)]
pub struct TenantContext {
    organization: Arc<Organization>,
    source: TenantSource,
}

impl TenantContext {
    /// Binds a request to an organization.
    #[must_use]
    pub fn new(organization: Arc<Organization>, source: TenantSource) -> Self {
        Self {
            organization,
            source,
        }
    }

    /// Returns the organization ID.
    #[must_use]
    pub fn organization_id(&self) -> OrganizationId {
        self.organization.id()
    }

    /// Returns the organization snapshot taken at resolution time.
    #[must_use]
    pub fn organization(&self) -> &Organization {
        &self.organization
    }

    /// Returns how the tenant was identified.
    #[must_use]
    pub const fn source(&self) -> TenantSource {
        self.source
    }

    /// Returns true if the feature flag is enabled. Missing flags are disabled.
    #[must_use]
    pub fn has_feature(&self, name: &str) -> bool {
        self.organization.has_feature(name)
    }

    /// Fails closed when no tenant was resolved.
    pub fn require(context: Option<&Self>) -> Result<&Self> {
        context.ok_or_else(|| SecurityError::unresolved_tenant(""))
    }
}
