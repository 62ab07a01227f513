//! Current-organization handlers.

use axum::extract::{Path, State};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use commons_security::tenant::{Branding, TenantContext, TenantSource};

use crate::error::ApiResult;
use crate::middleware::{Auth, Tenant};
use crate::response::ApiResponse;
use crate::state::AppState;

/// What a member sees of their organization.
#[derive(Debug, Serialize)]
pub struct OrganizationSummary {
    /// Organization ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Slug
    pub slug: String,
    /// Platform subdomain
    pub subdomain: Option<String>,
    /// Custom domain, once verified
    pub custom_domain: Option<String>,
    /// Canonical URL
    pub url: String,
    /// Plan
    pub plan: Option<String>,
    /// Feature flags
    pub features: BTreeMap<String, bool>,
    /// Branding
    pub branding: Branding,
    /// How this request was matched to the organization
    pub resolved_via: TenantSource,
}

impl OrganizationSummary {
    /// Builds the summary of a resolved tenant.
    #[must_use]
    pub fn new(tenant: &TenantContext, base_domain: &str) -> Self {
        let org = tenant.organization();
        Self {
            id: org.id().to_string(),
            name: org.name().to_string(),
            slug: org.slug().to_string(),
            subdomain: org.subdomain().map(ToString::to_string),
            custom_domain: org.verified_custom_domain().map(ToString::to_string),
            url: org.tenant_url(base_domain, true),
            plan: org.plan().map(ToString::to_string),
            features: org.features().clone(),
            branding: org.branding().clone(),
            resolved_via: tenant.source(),
        }
    }
}

/// Feature flag lookup result.
#[derive(Debug, Serialize)]
pub struct FeatureFlag {
    /// Flag name
    pub feature: String,
    /// Whether the organization has it enabled
    pub enabled: bool,
}

/// Current organization.
///
/// GET /api/organization
pub async fn current_organization(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Auth(_): Auth,
) -> ApiResult<ApiResponse<OrganizationSummary>> {
    Ok(ApiResponse::success(OrganizationSummary::new(
        &tenant,
        &state.tenancy.base_domain,
    )))
}

/// Feature flag of the current organization. Unknown flags are disabled.
///
/// GET /api/organization/features/{feature}
pub async fn feature_flag(
    Tenant(tenant): Tenant,
    Auth(_): Auth,
    Path(feature): Path<String>,
) -> ApiResult<ApiResponse<FeatureFlag>> {
    let enabled = tenant.has_feature(&feature);
    Ok(ApiResponse::success(FeatureFlag { feature, enabled }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use commons_security::tenant::{CustomDomain, Organization};

    #[test]
    fn test_summary_hides_unverified_domain() {
        let org = Organization::new("Acme Towers", "acme")
            .with_subdomain("acme")
            .with_feature("payments", true)
            .with_custom_domain(CustomDomain::new("hoa.acme.org", "commons-verify-x"));
        let tenant = TenantContext::new(Arc::new(org), TenantSource::Subdomain);

        let summary = OrganizationSummary::new(&tenant, "platform.com");
        assert_eq!(summary.slug, "acme");
        assert!(summary.custom_domain.is_none());
        assert_eq!(summary.url, "https://acme.platform.com");
        assert_eq!(summary.features.get("payments"), Some(&true));
        assert_eq!(summary.resolved_via, TenantSource::Subdomain);
    }
}
