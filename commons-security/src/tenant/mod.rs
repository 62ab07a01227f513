//! Multi-tenant support.
//!
//! Organizations are the tenants. A request is bound to at most one
//! organization, resolved from its host header:
//!
//! - `<subdomain>.<base_domain>` for platform subdomains
//! - a verified custom domain owned by the organization
//!
//! The resolved [`TenantContext`] is immutable and lives only as long as the
//! request that produced it.

mod context;
mod directory;
mod organization;
mod resolver;

pub use context::{TenantContext, TenantSource};
pub use directory::{InMemoryDirectory, OrganizationDirectory};
pub use organization::{
    Branding, CertificateStatus, CustomDomain, Organization, OrganizationId, OrganizationStatus,
};
pub use resolver::{
    HostResolver, HostTarget, TenantResolver, generate_verification_token, normalize_host,
};
