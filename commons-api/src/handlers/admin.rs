//! Super-admin handlers.
//!
//! Organization provisioning and domain management. These routes are not
//! tenant scoped: the organization is named in the path, and only
//! platform operators reach them.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Instrument, info};

use commons_security::tenant::{
    Branding, CertificateStatus, CustomDomain, Organization, OrganizationId, OrganizationStatus,
    generate_verification_token, normalize_host,
};
use commons_telemetry::spans::admin_span;

use crate::error::{ApiError, ApiResult};
use crate::middleware::Auth;
use crate::response::{ApiResponse, CreatedResponse, PaginatedResponse};
use crate::state::AppState;

/// DNS label under which the owner publishes the verification token.
pub const VERIFICATION_RECORD_PREFIX: &str = "_commons-verify";

/// Organization as seen by platform operators.
#[derive(Debug, Serialize)]
pub struct OrganizationDetail {
    /// Organization ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Slug
    pub slug: String,
    /// Status
    pub status: OrganizationStatus,
    /// Platform subdomain
    pub subdomain: Option<String>,
    /// Custom domain, verified or not
    pub custom_domain: Option<String>,
    /// Whether the custom domain is verified
    pub custom_domain_verified: bool,
    /// Plan
    pub plan: Option<String>,
    /// Feature flags
    pub features: BTreeMap<String, bool>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<&Organization> for OrganizationDetail {
    fn from(org: &Organization) -> Self {
        Self {
            id: org.id().to_string(),
            name: org.name().to_string(),
            slug: org.slug().to_string(),
            status: org.status(),
            subdomain: org.subdomain().map(ToString::to_string),
            custom_domain: org.custom_domain().map(|d| d.domain().to_string()),
            custom_domain_verified: org.verified_custom_domain().is_some(),
            plan: org.plan().map(ToString::to_string),
            features: org.features().clone(),
            created_at: org.created_at(),
            updated_at: org.updated_at(),
        }
    }
}

/// DNS record the domain owner must publish.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct VerificationRecord {
    /// Record type
    pub record_type: &'static str,
    /// Fully qualified record name
    pub name: String,
    /// Expected value
    pub value: String,
}

/// Custom domain state.
#[derive(Debug, Serialize)]
pub struct CustomDomainDetail {
    /// Domain name
    pub domain: String,
    /// Verified flag
    pub verified: bool,
    /// When ownership was confirmed
    pub verified_at: Option<DateTime<Utc>>,
    /// Certificate status
    pub certificate_status: CertificateStatus,
    /// Certificate expiry
    pub certificate_expires_at: Option<DateTime<Utc>>,
    /// Record to publish, until verified
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationRecord>,
}

impl From<&CustomDomain> for CustomDomainDetail {
    fn from(domain: &CustomDomain) -> Self {
        let verification = (!domain.is_verified()).then(|| VerificationRecord {
            record_type: "TXT",
            name: format!("{VERIFICATION_RECORD_PREFIX}.{}", domain.domain()),
            value: domain.verification_token().to_string(),
        });
        Self {
            domain: domain.domain().to_string(),
            verified: domain.is_verified(),
            verified_at: domain.verified_at(),
            certificate_status: domain.certificate_status(),
            certificate_expires_at: domain.certificate_expires_at(),
            verification,
        }
    }
}

/// Domain configuration of one organization.
#[derive(Debug, Serialize)]
pub struct DomainConfig {
    /// Organization ID
    pub organization_id: String,
    /// Platform subdomain
    pub subdomain: Option<String>,
    /// URL of the platform subdomain
    pub subdomain_url: Option<String>,
    /// Custom domain
    pub custom_domain: Option<CustomDomainDetail>,
    /// Canonical URL
    pub url: String,
}

impl DomainConfig {
    fn new(org: &Organization, base_domain: &str) -> Self {
        Self {
            organization_id: org.id().to_string(),
            subdomain: org.subdomain().map(ToString::to_string),
            subdomain_url: org
                .subdomain()
                .map(|s| format!("https://{s}.{base_domain}")),
            custom_domain: org.custom_domain().map(CustomDomainDetail::from),
            url: org.tenant_url(base_domain, true),
        }
    }
}

/// List organizations query parameters.
#[derive(Debug, Deserialize)]
pub struct ListOrganizationsQuery {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Filter by status
    pub status: Option<OrganizationStatus>,
}

const fn default_page() -> u32 {
    1
}

const fn default_per_page() -> u32 {
    20
}

const MAX_PER_PAGE: u32 = 100;

/// Create organization request.
#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    /// Display name
    pub name: String,
    /// Unique slug
    pub slug: String,
    /// Platform subdomain
    pub subdomain: Option<String>,
    /// Plan
    pub plan: Option<String>,
    /// Feature flags
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
    /// Branding
    #[serde(default)]
    pub branding: Branding,
}

/// Update domains request.
///
/// An absent field is left alone; `null` removes the value.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateDomainsRequest {
    /// New subdomain
    #[serde(default, deserialize_with = "double_option")]
    pub subdomain: Option<Option<String>>,
    /// New custom domain
    #[serde(default, deserialize_with = "double_option")]
    pub custom_domain: Option<Option<String>>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Verify domain request.
#[derive(Debug, Deserialize)]
pub struct VerifyDomainRequest {
    /// Token found in the owner's DNS record
    pub token: String,
}

fn parse_id(raw: &str) -> ApiResult<OrganizationId> {
    OrganizationId::from_str(raw)
        .map_err(|_| ApiError::BadRequest(format!("Invalid organization id: {raw}")))
}

fn validate_slug(slug: &str) -> ApiResult<()> {
    let valid = !slug.is_empty()
        && slug.len() <= 63
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Invalid slug '{slug}': use up to 63 lowercase letters, digits and hyphens"
        )))
    }
}

/// List organizations.
///
/// GET /api/admin/organizations
pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
    Auth(_): Auth,
    Query(query): Query<ListOrganizationsQuery>,
) -> ApiResult<PaginatedResponse<OrganizationDetail>> {
    let organizations: Vec<OrganizationDetail> = state
        .directory()
        .list()
        .await?
        .iter()
        .filter(|org| query.status.is_none_or(|s| org.status() == s))
        .map(|org| OrganizationDetail::from(org.as_ref()))
        .collect();

    Ok(PaginatedResponse::paginate(
        organizations,
        query.page,
        query.per_page.min(MAX_PER_PAGE),
    ))
}

/// Provision an organization.
///
/// POST /api/admin/organizations
pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Json(request): Json<CreateOrganizationRequest>,
) -> ApiResult<CreatedResponse<OrganizationDetail>> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    let slug = request.slug.trim().to_lowercase();
    validate_slug(&slug)?;

    let mut org = Organization::new(name, slug).with_branding(request.branding);
    if let Some(plan) = request.plan {
        org = org.with_plan(plan);
    }
    if let Some(subdomain) = request.subdomain {
        let subdomain = subdomain.trim().to_lowercase();
        state
            .resolver()
            .hosts()
            .validate_subdomain(&subdomain)
            .map_err(ApiError::from_input)?;
        org = org.with_subdomain(subdomain);
    }
    for (feature, enabled) in request.features {
        org = org.with_feature(feature, enabled);
    }

    let span = admin_span("create_organization", &org.id().to_string());
    async move {
        let created = state.directory().insert(org).await?;
        info!(
            slug = created.slug(),
            operator = %auth.principal().user_id,
            "Organization provisioned"
        );
        Ok::<_, ApiError>(CreatedResponse::new(OrganizationDetail::from(created.as_ref())))
    }
    .instrument(span)
    .await
}

/// Take an organization offline. It stops resolving from every host.
///
/// POST /api/admin/organizations/{id}/suspend
pub async fn suspend_organization(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<OrganizationDetail>> {
    let id = parse_id(&id)?;
    async move {
        let mut org = state.directory().get(id).await?.as_ref().clone();
        org.suspend();
        let saved = state.directory().save(org).await?;
        info!(operator = %auth.principal().user_id, "Organization suspended");
        Ok::<_, ApiError>(ApiResponse::success_with_message(
            OrganizationDetail::from(saved.as_ref()),
            "Organization suspended",
        ))
    }
    .instrument(admin_span("suspend_organization", &id.to_string()))
    .await
}

/// Bring a suspended organization back.
///
/// POST /api/admin/organizations/{id}/activate
pub async fn activate_organization(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<OrganizationDetail>> {
    let id = parse_id(&id)?;
    async move {
        let mut org = state.directory().get(id).await?.as_ref().clone();
        org.activate();
        let saved = state.directory().save(org).await?;
        info!(operator = %auth.principal().user_id, "Organization activated");
        Ok::<_, ApiError>(ApiResponse::success_with_message(
            OrganizationDetail::from(saved.as_ref()),
            "Organization activated",
        ))
    }
    .instrument(admin_span("activate_organization", &id.to_string()))
    .await
}

/// Domain configuration of an organization.
///
/// GET /api/admin/domains/{id}
pub async fn get_domains(
    State(state): State<Arc<AppState>>,
    Auth(_): Auth,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<DomainConfig>> {
    let id = parse_id(&id)?;
    let org = state.directory().get(id).await?;
    Ok(ApiResponse::success(DomainConfig::new(
        &org,
        &state.tenancy.base_domain,
    )))
}

/// Change the subdomain and/or custom domain.
///
/// A new custom domain gets a fresh verification token and starts
/// unverified with a pending certificate.
///
/// PUT /api/admin/domains/{id}
pub async fn update_domains(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(id): Path<String>,
    Json(request): Json<UpdateDomainsRequest>,
) -> ApiResult<ApiResponse<DomainConfig>> {
    let id = parse_id(&id)?;
    async move {
        let mut org = state.directory().get(id).await?.as_ref().clone();
        let hosts = state.resolver().hosts();

        match request.subdomain {
            Some(Some(subdomain)) => {
                let subdomain = subdomain.trim().to_lowercase();
                hosts
                    .validate_subdomain(&subdomain)
                    .map_err(ApiError::from_input)?;
                org.set_subdomain(Some(subdomain));
            }
            Some(None) => org.set_subdomain(None),
            None => {}
        }

        match request.custom_domain {
            Some(Some(domain)) => {
                let domain = normalize_host(&domain);
                hosts
                    .validate_custom_domain(&domain)
                    .map_err(ApiError::from_input)?;
                let token = generate_verification_token(&state.tenancy.verification_token_prefix)?;
                org.set_custom_domain(domain, token);
            }
            Some(None) => org.clear_custom_domain(),
            None => {}
        }

        let saved = state.directory().save(org).await?;
        info!(
            subdomain = ?saved.subdomain(),
            custom_domain = ?saved.custom_domain().map(CustomDomain::domain),
            operator = %auth.principal().user_id,
            "Domains updated"
        );
        Ok::<_, ApiError>(ApiResponse::success(DomainConfig::new(
            &saved,
            &state.tenancy.base_domain,
        )))
    }
    .instrument(admin_span("update_domains", &id.to_string()))
    .await
}

/// Remove the custom domain.
///
/// DELETE /api/admin/domains/{id}
pub async fn delete_domain(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<DomainConfig>> {
    let id = parse_id(&id)?;
    async move {
        let mut org = state.directory().get(id).await?.as_ref().clone();
        if org.custom_domain().is_none() {
            return Err(ApiError::BadRequest(
                "Organization has no custom domain".to_string(),
            ));
        }
        org.clear_custom_domain();
        let saved = state.directory().save(org).await?;
        info!(operator = %auth.principal().user_id, "Custom domain removed");
        Ok::<_, ApiError>(ApiResponse::success_with_message(
            DomainConfig::new(&saved, &state.tenancy.base_domain),
            "Custom domain removed",
        ))
    }
    .instrument(admin_span("delete_domain", &id.to_string()))
    .await
}

/// Confirm ownership of the custom domain.
///
/// The operator submits the token found in the owner's TXT record. A
/// verified domain starts resolving immediately.
///
/// POST /api/admin/domains/{id}/verify
pub async fn verify_domain(
    State(state): State<Arc<AppState>>,
    Auth(auth): Auth,
    Path(id): Path<String>,
    Json(request): Json<VerifyDomainRequest>,
) -> ApiResult<ApiResponse<DomainConfig>> {
    let id = parse_id(&id)?;
    async move {
        let mut org = state.directory().get(id).await?.as_ref().clone();
        let Some(domain) = org.custom_domain() else {
            return Err(ApiError::BadRequest(
                "Organization has no custom domain".to_string(),
            ));
        };

        if domain.is_verified() {
            return Ok(ApiResponse::success_with_message(
                DomainConfig::new(&org, &state.tenancy.base_domain),
                "Domain already verified",
            ));
        }
        if domain.verification_token() != request.token.trim() {
            return Err(ApiError::BadRequest(
                "Verification token does not match".to_string(),
            ));
        }

        org.mark_domain_verified(Utc::now());
        let saved = state.directory().save(org).await?;
        info!(
            custom_domain = ?saved.verified_custom_domain(),
            operator = %auth.principal().user_id,
            "Custom domain verified"
        );
        Ok::<_, ApiError>(ApiResponse::success_with_message(
            DomainConfig::new(&saved, &state.tenancy.base_domain),
            "Domain verified",
        ))
    }
    .instrument(admin_span("verify_domain", &id.to_string()))
    .await
}
