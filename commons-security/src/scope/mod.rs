//! Tenant scoping of data access.
//!
//! Every persisted record type is an [`Entity`]. Tenant-scoped entities are
//! only reachable through a [`ScopedClient`], which rewrites each [`Query`]
//! with [`TenantScope::apply`] so it carries the request tenant's
//! `organizationId`, and checks results with [`TenantScope::validate`].
//!
//! Records persisted outside [`Entity`] are invisible to scoping.

mod entity;
mod middleware;
mod query;
mod store;

pub use entity::{Entity, Scoping};
pub use middleware::TenantScope;
pub use query::{Action, Filter, ID_FIELD, ORGANIZATION_ID_FIELD, Payload, Query, Record};
pub use store::{MemoryStore, QueryExecutor, QueryOutput, ScopedClient};
