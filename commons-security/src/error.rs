//! Security error types.
//!
//! Every failure of tenant resolution, authentication, authorization and
//! scoped data access is terminal: callers surface it, nothing retries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Security-related errors.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityError {
    /// Subdomain is on the reserved list.
    #[error("Subdomain '{subdomain}' is reserved")]
    ReservedName {
        /// The rejected label.
        subdomain: String,
    },

    /// Subdomain is not a valid tenant label.
    #[error("Invalid subdomain '{subdomain}': {reason}")]
    InvalidSubdomain {
        /// The rejected label.
        subdomain: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Host is not a valid custom domain.
    #[error("Invalid custom domain '{domain}': {reason}")]
    InvalidCustomDomain {
        /// The rejected domain.
        domain: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Custom domain exists but has not been verified.
    #[error("Custom domain '{domain}' is not verified")]
    UnverifiedDomain {
        /// The unverified domain.
        domain: String,
    },

    /// No active organization matches the host.
    #[error("No organization resolved for host '{host}'")]
    UnresolvedTenant {
        /// Normalised host, or empty when no host was available.
        host: String,
    },

    /// No valid session.
    #[error("Authentication required: {reason}")]
    Unauthenticated {
        /// Reason for the failure.
        reason: String,
    },

    /// Session belongs to another organization.
    #[error("User '{user_id}' does not belong to organization '{organization_id}'")]
    TenantMismatch {
        /// The session user.
        user_id: String,
        /// The resolved organization.
        organization_id: String,
    },

    /// Role is below what the route requires.
    #[error("User '{user_id}' requires role '{required}'")]
    InsufficientRole {
        /// The session user.
        user_id: String,
        /// Minimum required role.
        required: String,
    },

    /// A query result belonged to another organization.
    #[error("Tenant isolation violation: {reason}")]
    TenantIsolationViolation {
        /// Description of the violation.
        reason: String,
    },

    /// A write violated a store constraint.
    #[error("Data constraint violated on {entity}: {reason}")]
    DataConstraint {
        /// Entity written.
        entity: String,
        /// Constraint description.
        reason: String,
    },

    /// Record not found within the tenant.
    #[error("{entity} not found: {id}")]
    RecordNotFound {
        /// Entity queried.
        entity: String,
        /// Requested id.
        id: String,
    },

    /// Organization not found.
    #[error("Organization not found: {organization_id}")]
    OrganizationNotFound {
        /// Requested id.
        organization_id: String,
    },

    /// Uniqueness conflict (slug, subdomain, custom domain).
    #[error("Conflict: {reason}")]
    Conflict {
        /// Conflict description.
        reason: String,
    },

    /// Query could not be interpreted.
    #[error("Invalid query: {reason}")]
    InvalidQuery {
        /// Reason.
        reason: String,
    },

    /// Random generation failed.
    #[error("Random generation failed")]
    RandomUnavailable,
}

impl SecurityError {
    /// Creates a reserved name error.
    #[must_use]
    pub fn reserved_name(subdomain: impl Into<String>) -> Self {
        Self::ReservedName {
            subdomain: subdomain.into(),
        }
    }

    /// Creates an invalid subdomain error.
    #[must_use]
    pub fn invalid_subdomain(subdomain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSubdomain {
            subdomain: subdomain.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid custom domain error.
    #[must_use]
    pub fn invalid_custom_domain(domain: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCustomDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unverified domain error.
    #[must_use]
    pub fn unverified_domain(domain: impl Into<String>) -> Self {
        Self::UnverifiedDomain {
            domain: domain.into(),
        }
    }

    /// Creates an unresolved tenant error.
    #[must_use]
    pub fn unresolved_tenant(host: impl Into<String>) -> Self {
        Self::UnresolvedTenant { host: host.into() }
    }

    /// Creates an unauthenticated error.
    #[must_use]
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    /// Creates a tenant mismatch error.
    #[must_use]
    pub fn tenant_mismatch(user_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self::TenantMismatch {
            user_id: user_id.into(),
            organization_id: organization_id.into(),
        }
    }

    /// Creates an insufficient role error.
    #[must_use]
    pub fn insufficient_role(user_id: impl Into<String>, required: impl Into<String>) -> Self {
        Self::InsufficientRole {
            user_id: user_id.into(),
            required: required.into(),
        }
    }

    /// Creates a tenant isolation violation error.
    #[must_use]
    pub fn tenant_isolation_violation(reason: impl Into<String>) -> Self {
        Self::TenantIsolationViolation {
            reason: reason.into(),
        }
    }

    /// Creates a data constraint error.
    #[must_use]
    pub fn data_constraint(entity: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataConstraint {
            entity: entity.into(),
            reason: reason.into(),
        }
    }

    /// Creates a record not found error.
    #[must_use]
    pub fn record_not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::RecordNotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an organization not found error.
    #[must_use]
    pub fn organization_not_found(organization_id: impl Into<String>) -> Self {
        Self::OrganizationNotFound {
            organization_id: organization_id.into(),
        }
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    /// Creates an invalid query error.
    #[must_use]
    pub fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            reason: reason.into(),
        }
    }

    /// Returns true if this error came from host-to-tenant resolution.
    #[must_use]
    pub const fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::ReservedName { .. }
                | Self::InvalidSubdomain { .. }
                | Self::InvalidCustomDomain { .. }
                | Self::UnverifiedDomain { .. }
                | Self::UnresolvedTenant { .. }
        )
    }

    /// Returns true if this error is related to authentication.
    #[must_use]
    pub const fn is_authentication_error(&self) -> bool {
        matches!(self, Self::Unauthenticated { .. })
    }

    /// Returns true if this error is related to authorization.
    #[must_use]
    pub const fn is_authorization_error(&self) -> bool {
        matches!(
            self,
            Self::TenantMismatch { .. } | Self::InsufficientRole { .. }
        )
    }

    /// Returns true if this error came from the scoped data layer.
    #[must_use]
    pub const fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::TenantIsolationViolation { .. }
                | Self::DataConstraint { .. }
                | Self::RecordNotFound { .. }
                | Self::InvalidQuery { .. }
        )
    }
}

/// A specialized Result type for security operations.
pub type Result<T> = std::result::Result<T, SecurityError>;
