//! Tenant resolution middleware.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Request, Uri, header::HOST},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{Span, info};

use commons_security::tenant::{OrganizationId, TenantContext};

use super::auth::session_principal;
use crate::error::ApiError;
use crate::state::AppState;

const FORWARDED_HOST: &str = "x-forwarded-host";

#[derive(Debug, Deserialize)]
struct OrganizationParam {
    #[serde(rename = "organizationId")]
    organization_id: Option<OrganizationId>,
}

/// Returns the `organizationId` query parameter, if present and well formed.
fn requested_organization(uri: &Uri) -> Option<OrganizationId> {
    Query::<OrganizationParam>::try_from_uri(uri)
        .ok()
        .and_then(|Query(param)| param.organization_id)
}

/// Returns the host a request was addressed to.
///
/// `X-Forwarded-Host` is honoured only when the deployment sits behind a
/// proxy that sets it; otherwise clients could pick their tenant.
#[must_use]
pub fn request_host(headers: &HeaderMap, trust_forwarded_host: bool) -> Option<String> {
    let forwarded = trust_forwarded_host
        .then(|| headers.get(FORWARDED_HOST))
        .flatten()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    forwarded
        .or_else(|| headers.get(HOST).and_then(|value| value.to_str().ok()))
        .map(ToString::to_string)
}

/// Returns the organization a super-admin asked to act on from a platform
/// host. Anyone else, or any tenant host, gets `None`.
fn impersonation_target(state: &AppState, host: &str, request: &Request<Body>) -> Option<OrganizationId> {
    let organization_id = requested_organization(request.uri())?;
    if !state.resolver().hosts().is_platform(host) {
        return None;
    }
    session_principal(state, request.headers())
        .filter(|principal| principal.role.is_super_admin())
        .map(|principal| {
            info!(
                user_id = %principal.user_id,
                organization_id = %organization_id,
                "Super-admin acting on organization"
            );
            organization_id
        })
}

/// Resolves the request host to a tenant and stores it in request extensions.
///
/// On a platform host a super-admin may name the organization with the
/// `organizationId` query parameter. Any resolution failure ends the
/// request with the generic 400 response.
pub async fn resolve_tenant(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let host = request_host(request.headers(), state.tenancy.trust_forwarded_host)
        .or_else(|| request.uri().authority().map(|a| a.as_str().to_string()));

    let Some(host) = host else {
        return ApiError::UnresolvedTenant.into_response();
    };

    let resolved = match impersonation_target(&state, &host, &request) {
        Some(organization_id) => state.resolver().resolve_impersonation(organization_id).await,
        None => state.resolver().resolve(&host).await,
    };

    match resolved {
        Ok(tenant) => {
            Span::current().record("tenant", tenant.organization().slug());
            request.extensions_mut().insert(tenant);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Extractor for the resolved tenant.
///
/// Rejects with the resolution error when the route was not behind
/// [`resolve_tenant`], so a handler can never run without a tenant.
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantContext);

impl<S> axum::extract::FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(Tenant)
            .ok_or(ApiError::UnresolvedTenant)
    }
}
