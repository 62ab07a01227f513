//! # Commons API
//!
//! HTTP surface of the Commons platform.
//!
//! This crate provides:
//! - Session tokens (HS256 JWT) carried as a bearer header or session cookie
//! - Tenant resolution middleware binding each request to one organization
//! - Guard middleware (`with_auth`, `with_tenant_auth`, `with_super_admin_auth`, ...)
//! - Tenant-scoped handlers and super-admin organization and domain management
//!
//! # Routes
//!
//! - `/api/health` - Health check (public)
//! - `/api/organization` - Current organization (tenant auth)
//! - `/api/payments` - Payments of the current organization (tenant auth)
//! - `/api/records/{entity}` - Generic scoped record access (tenant auth)
//! - `/api/admin/organizations` - Organization administration (super-admin)
//! - `/api/admin/domains/{id}` - Domain management (super-admin)
//!
//! Tenant routes resolve the `Host` header before authentication runs, so a
//! request for a reserved or unknown host is rejected without touching the
//! session.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ApiConfig;
pub use error::ApiError;
pub use server::ApiServer;
pub use state::AppState;
