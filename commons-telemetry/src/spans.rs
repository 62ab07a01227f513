//! Span definitions for request tracing.

use tracing::{Span, info_span};

/// Create a span for an inbound HTTP request.
///
/// The `tenant` field is recorded later, once the host is resolved.
///
/// ```
/// use commons_telemetry::spans::request_span;
///
/// let span = request_span("req-123", "GET", "/api/payments", "acme.platform.com");
/// let _guard = span.enter();
/// ```
#[must_use]
pub fn request_span(request_id: &str, method: &str, path: &str, host: &str) -> Span {
    info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        host = %host,
        tenant = tracing::field::Empty,
        otel.kind = "server"
    )
}

/// Create a span for one tenant-scoped data access.
#[must_use]
pub fn scoped_query_span(entity: &str, action: &str, organization_id: &str) -> Span {
    info_span!(
        "scoped_query",
        entity = %entity,
        action = %action,
        organization_id = %organization_id
    )
}

/// Create a span for a super-admin operation on an organization.
#[must_use]
pub fn admin_span(operation: &str, organization_id: &str) -> Span {
    info_span!(
        "admin",
        operation = %operation,
        organization_id = %organization_id
    )
}
