//! # Commons Security
//!
//! Tenant isolation for the Commons platform.
//!
//! This crate provides:
//! - Host-based tenant resolution (platform subdomains and verified custom domains)
//! - A request-scoped tenant context that handlers receive explicitly
//! - Tenant scoping of every data-access query and validation of its results
//! - The `Unauthenticated -> Authenticated -> Authorized` request pipeline
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use commons_core::config::TenancyConfig;
//! use commons_security::scope::{Entity, Filter, MemoryStore, ScopedClient, TenantScope};
//! use commons_security::tenant::{HostResolver, InMemoryDirectory, TenantResolver};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = Arc::new(InMemoryDirectory::new());
//! let resolver = TenantResolver::new(HostResolver::new(&TenancyConfig::default()), directory);
//!
//! let tenant = resolver.resolve("acme.platform.com").await?;
//! let client = ScopedClient::new(Arc::new(MemoryStore::new()), TenantScope::from_context(&tenant));
//! let payments = client.find_many(Entity::Payment, Filter::All).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod access;
pub mod error;
pub mod scope;
pub mod tenant;

pub use error::{Result, SecurityError};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::access::{Authenticated, Authorized, Guard, Principal, Role, authenticate};
    pub use crate::error::{Result, SecurityError};
    pub use crate::scope::{
        Entity, Filter, MemoryStore, Query, QueryExecutor, QueryOutput, Record, ScopedClient,
        TenantScope,
    };
    pub use crate::tenant::{
        InMemoryDirectory, Organization, OrganizationDirectory, OrganizationId, TenantContext,
        TenantResolver, TenantSource,
    };
}
