//! API error types.
//!
//! Security failures are mapped to fixed statuses with generic messages so a
//! response never reveals whether an organization, domain or record exists
//! in another tenant.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use commons_security::SecurityError;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::middleware::current_request_id;

/// Message returned for every tenant resolution failure.
pub const UNRESOLVED_TENANT_MESSAGE: &str = "Unable to resolve organization for this host";

/// API error type.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No organization could be resolved for the request host
    #[error("Unable to resolve organization for this host")]
    UnresolvedTenant,

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Access forbidden
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request / validation error
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Conflict (e.g., subdomain already taken)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnresolvedTenant | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code string.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnresolvedTenant => "TENANT_NOT_RESOLVED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the message sent to the client. Internal details stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Maps validation failures of admin input to 400 with the detailed reason.
    ///
    /// Unlike the [`From`] conversion, which hides host details behind the
    /// generic resolution message, this is for errors about a request body.
    #[must_use]
    pub fn from_input(err: SecurityError) -> Self {
        match err {
            SecurityError::ReservedName { .. }
            | SecurityError::InvalidSubdomain { .. }
            | SecurityError::InvalidCustomDomain { .. } => Self::BadRequest(err.to_string()),
            other => other.into(),
        }
    }
}

impl From<SecurityError> for ApiError {
    fn from(err: SecurityError) -> Self {
        if err.is_resolution_error() {
            debug!(error = %err, "Tenant resolution failed");
            return Self::UnresolvedTenant;
        }

        match err {
            SecurityError::Unauthenticated { .. } => {
                debug!(error = %err, "Request rejected");
                Self::Unauthorized("no valid session".to_string())
            }
            SecurityError::TenantMismatch { .. } | SecurityError::InsufficientRole { .. } => {
                warn!(error = %err, "Request rejected");
                Self::Forbidden("insufficient permissions".to_string())
            }
            SecurityError::RecordNotFound { ref entity, .. } => {
                Self::NotFound(format!("{entity} not found"))
            }
            SecurityError::OrganizationNotFound { .. } => {
                Self::NotFound("organization not found".to_string())
            }
            SecurityError::Conflict { reason } => Self::Conflict(reason),
            SecurityError::InvalidQuery { reason } => Self::BadRequest(reason),
            other => {
                error!(error = %other, "Data access failed");
                Self::Internal(other.to_string())
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error status
    pub status: &'static str,
    /// Error code
    pub code: &'static str,
    /// Error message
    pub message: String,
    /// Request ID (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            status: "error",
            code: self.error_code(),
            message: self.public_message(),
            request_id: current_request_id(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
