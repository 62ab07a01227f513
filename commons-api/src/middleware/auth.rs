//! Session authentication and route guards.
//!
//! Each guard runs the `Unauthenticated -> Authenticated -> Authorized`
//! pipeline and only calls the next service when every stage succeeds.
//! Tenant guards must sit behind [`resolve_tenant`](super::resolve_tenant).

use axum::{
    body::Body,
    extract::State,
    http::{
        HeaderMap, Request,
        header::{AUTHORIZATION, COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use commons_security::access::{Authorized, Guard, Principal};
use commons_security::tenant::TenantContext;

use crate::auth::{extract_bearer_token, extract_cookie};
use crate::error::ApiError;
use crate::state::AppState;

/// Returns the principal of a valid session, if any.
///
/// The bearer header wins over the session cookie. Invalid or expired
/// tokens count as no session.
#[must_use]
pub fn session_principal(state: &AppState, headers: &HeaderMap) -> Option<Principal> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token);
    let cookie = || {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .find_map(|h| extract_cookie(h, &state.config.session_cookie))
    };

    let token = bearer.or_else(cookie)?;
    match state.jwt_manager().principal(token) {
        Ok(principal) => Some(principal),
        Err(e) => {
            debug!(error = %e, "Ignoring invalid session token");
            None
        }
    }
}

async fn run_guard(guard: Guard, state: &AppState, mut request: Request<Body>, next: Next) -> Response {
    let principal = session_principal(state, request.headers());
    let outcome = guard.check(principal, request.extensions().get::<TenantContext>());

    match outcome {
        Ok(authorized) => {
            request.extensions_mut().insert(authorized);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// Requires a valid session (401 otherwise).
pub async fn with_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    run_guard(Guard::Authenticated, &state, request, next).await
}

/// Requires a session belonging to the resolved tenant (403 otherwise).
/// Super-admins pass.
pub async fn with_tenant_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    run_guard(Guard::Tenant, &state, request, next).await
}

/// [`with_tenant_auth`] plus at least the board member role.
pub async fn with_board_tenant_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    run_guard(Guard::TenantBoard, &state, request, next).await
}

/// [`with_tenant_auth`] plus at least the admin role.
pub async fn with_admin_tenant_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    run_guard(Guard::TenantAdmin, &state, request, next).await
}

/// Requires a super-admin session. No tenant is involved.
pub async fn with_super_admin_auth(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    run_guard(Guard::SuperAdmin, &state, request, next).await
}

/// Extractor for the authorized session.
#[derive(Debug, Clone)]
pub struct Auth(pub Authorized);

impl<S> axum::extract::FromRequestParts<S> for Auth
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
            .get::<Authorized>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| ApiError::Unauthorized("no valid session".to_string()))
    }
}
