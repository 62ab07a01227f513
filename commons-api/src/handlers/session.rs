//! Session handlers.

use commons_security::access::Principal;

use crate::middleware::Auth;
use crate::response::ApiResponse;

/// The caller's session. Works on any host; no tenant is involved.
///
/// GET /api/session
pub async fn current_session(Auth(auth): Auth) -> ApiResponse<Principal> {
    ApiResponse::success(auth.principal().clone())
}
