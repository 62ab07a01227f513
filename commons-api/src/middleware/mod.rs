//! API middleware components.
//!
//! This module provides middleware for:
//! - Tenant resolution from the request host
//! - Session authentication and route guards
//! - Request ID generation

pub mod auth;
mod request_id;
mod tenant;

pub use auth::{
    Auth, session_principal, with_admin_tenant_auth, with_auth, with_board_tenant_auth,
    with_super_admin_auth, with_tenant_auth,
};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer, current_request_id};
pub use tenant::{Tenant, request_host, resolve_tenant};
