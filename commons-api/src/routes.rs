//! API route definitions.
//!
//! Route groups share one router:
//! - public routes, no host or session checks
//! - session routes, any valid session on any host
//! - tenant routes, host resolution first, then a tenant guard whose role
//!   floor depends on the operation
//! - admin routes, super-admin guard only

use axum::{
    Router,
    body::Body,
    http::{
        HeaderValue, Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, HOST},
    },
    middleware,
    routing::{delete, get, patch, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{Span, warn};

use commons_telemetry::spans::request_span;

use crate::config::CorsConfig;
use crate::handlers::{admin, health, organization, payments, records, session};
use crate::middleware::{
    REQUEST_ID_HEADER, RequestId, RequestIdLayer, resolve_tenant, with_admin_tenant_auth,
    with_auth, with_board_tenant_auth, with_super_admin_auth, with_tenant_auth,
};
use crate::state::AppState;

/// Creates the API router with all routes and layers.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = build_cors_layer(&state.config.cors);
    let timeout = state.config.request_timeout();

    let public_routes = Router::new().route("/api/health", get(health::health_check));

    let session_routes = Router::new()
        .route("/api/session", get(session::current_session))
        .route_layer(middleware::from_fn_with_state(Arc::clone(&state), with_auth));

    let member_routes = Router::new()
        .route("/api/organization", get(organization::current_organization))
        .route(
            "/api/organization/features/{feature}",
            get(organization::feature_flag),
        )
        .route("/api/payments", get(payments::list_payments))
        .route("/api/payments/{id}", get(payments::get_payment))
        .route("/api/records/{entity}", get(records::list_records))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            with_tenant_auth,
        ));

    let board_routes = Router::new()
        .route("/api/payments", post(payments::create_payment))
        .route("/api/payments/{id}", patch(payments::update_payment))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            with_board_tenant_auth,
        ));

    let tenant_admin_routes = Router::new()
        .route("/api/payments/{id}", delete(payments::delete_payment))
        .route("/api/records/{entity}", post(records::create_record))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            with_admin_tenant_auth,
        ));

    // Host resolution wraps every tenant guard, so it runs first.
    let tenant_routes = Router::new()
        .merge(member_routes)
        .merge(board_routes)
        .merge(tenant_admin_routes)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            resolve_tenant,
        ));

    let admin_routes = Router::new()
        .route(
            "/api/admin/organizations",
            get(admin::list_organizations).post(admin::create_organization),
        )
        .route(
            "/api/admin/organizations/{id}/suspend",
            post(admin::suspend_organization),
        )
        .route(
            "/api/admin/organizations/{id}/activate",
            post(admin::activate_organization),
        )
        .route(
            "/api/admin/domains/{id}",
            get(admin::get_domains)
                .put(admin::update_domains)
                .delete(admin::delete_domain),
        )
        .route("/api/admin/domains/{id}/verify", post(admin::verify_domain))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            with_super_admin_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(tenant_routes)
        .merge(admin_routes)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(RequestIdLayer::new())
        .with_state(state)
}

fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(RequestId::as_str)
        .unwrap_or_default();
    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    request_span(
        request_id,
        request.method().as_str(),
        request.uri().path(),
        host,
    )
}

/// Builds the CORS layer from configuration.
///
/// Credentials are only allowed together with an explicit origin list.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    if !config.enabled {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, REQUEST_ID_HEADER.clone()])
        .max_age(std::time::Duration::from_secs(config.max_age_secs));

    if origins.is_empty() {
        if config.allow_credentials {
            warn!("CORS credentials require explicit origins; credentials disabled");
        }
        cors = cors.allow_origin(Any);
    } else {
        cors = cors
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(config.allow_credentials);
    }

    cors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use axum::http::Response;
    use commons_core::config::TenancyConfig;
    use async_trait::async_trait;
    use commons_security::access::{Principal, Role};
    use commons_security::scope::{Entity, MemoryStore, Query, QueryExecutor, QueryOutput, Record};
    use commons_security::tenant::{
        InMemoryDirectory, Organization, OrganizationId, TenantContext, TenantSource,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Store that counts the queries it executes.
    #[derive(Debug, Default)]
    struct CountingStore {
        inner: MemoryStore,
        executed: AtomicUsize,
    }

    impl CountingStore {
        fn executed(&self) -> usize {
            self.executed.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QueryExecutor for CountingStore {
        async fn execute(&self, query: Query) -> commons_security::Result<QueryOutput> {
            self.executed.fetch_add(1, Ordering::SeqCst);
            self.inner.execute(query).await
        }
    }

    struct Fixture {
        state: Arc<AppState>,
        store: Arc<CountingStore>,
        acme: OrganizationId,
        other: OrganizationId,
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(ApiConfig::default()).await
    }

    async fn fixture_with(config: ApiConfig) -> Fixture {
        let store = Arc::new(CountingStore::default());
        let state = Arc::new(AppState::new(
            config,
            TenancyConfig::default(),
            Arc::new(InMemoryDirectory::new()),
            Arc::clone(&store) as Arc<dyn QueryExecutor>,
        ));
        let acme = state
            .directory()
            .insert(Organization::new("Acme HOA", "acme").with_subdomain("acme"))
            .await
            .unwrap();
        let other = state
            .directory()
            .insert(Organization::new("Other HOA", "other").with_subdomain("other"))
            .await
            .unwrap();

        let acme_client =
            state.scoped_client(&TenantContext::new(Arc::clone(&acme), TenantSource::Subdomain));
        for (user, amount) in [("u-acme-1", 100), ("u-acme-2", 250)] {
            acme_client
                .create(
                    Entity::Payment,
                    record(json!({"userId": user, "amount": amount, "status": "PENDING", "dueDate": "2026-01-01"})),
                )
                .await
                .unwrap();
        }
        let other_client =
            state.scoped_client(&TenantContext::new(Arc::clone(&other), TenantSource::Subdomain));
        other_client
            .create(
                Entity::Payment,
                record(json!({"userId": "u-other", "amount": 999, "status": "PAID", "dueDate": "2026-02-01"})),
            )
            .await
            .unwrap();

        Fixture {
            acme: acme.id(),
            other: other.id(),
            state,
            store,
        }
    }

    fn token(state: &AppState, principal: &Principal) -> String {
        state.jwt_manager().issue(principal).unwrap()
    }

    fn request(method: Method, host: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri).header(HOST, host);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, Value) {
        let response: Response<Body> = create_router(Arc::clone(state))
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let f = fixture().await;
        let (status, body) = send(
            &f.state,
            request(Method::GET, "www.platform.com", "/api/health", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_tenant_session_sees_only_own_payments() {
        let f = fixture().await;
        let admin = Principal::member("u-admin", Role::Admin, f.acme);
        let token = token(&f.state, &admin);

        let (status, body) = send(
            &f.state,
            request(Method::GET, "acme.platform.com", "/api/payments", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let payments = body["data"]["payments"].as_array().unwrap();
        assert_eq!(payments.len(), 2);
        for payment in payments {
            assert_eq!(payment["organizationId"], f.acme.to_string());
        }
    }

    #[tokio::test]
    async fn test_resident_sees_only_own_payments() {
        let f = fixture().await;
        let resident = Principal::member("u-acme-1", Role::Resident, f.acme);
        let token = token(&f.state, &resident);

        let (status, body) = send(
            &f.state,
            request(Method::GET, "acme.platform.com", "/api/payments", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let payments = body["data"]["payments"].as_array().unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0]["userId"], "u-acme-1");
    }

    #[tokio::test]
    async fn test_other_tenant_session_is_forbidden() {
        let f = fixture().await;
        let outsider = Principal::member("u-other", Role::Admin, f.other);
        let token = token(&f.state, &outsider);

        let (status, body) = send(
            &f.state,
            request(Method::GET, "acme.platform.com", "/api/payments", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_rejected_requests_never_query() {
        let f = fixture().await;
        let seeded = f.store.executed();
        let outsider = token(&f.state, &Principal::member("u-other", Role::Admin, f.other));
        let resident = token(&f.state, &Principal::member("u-acme-1", Role::Resident, f.acme));

        let rejected = [
            request(Method::GET, "acme.platform.com", "/api/payments", Some(&outsider), None),
            request(Method::GET, "acme.platform.com", "/api/records/task", Some(&outsider), None),
            request(Method::GET, "acme.platform.com", "/api/payments", None, None),
            request(Method::GET, "www.platform.com", "/api/payments", Some(&resident), None),
            request(
                Method::POST,
                "acme.platform.com",
                "/api/records/task",
                Some(&resident),
                Some(json!({"title": "Paint fence"})),
            ),
        ];
        for request in rejected {
            let (status, _) = send(&f.state, request).await;
            assert!(status.is_client_error(), "{status}");
        }
        assert_eq!(f.store.executed(), seeded);
    }

    #[tokio::test]
    async fn test_reserved_host_rejected_before_auth() {
        let f = fixture().await;
        for host in ["www.platform.com", "ghost.platform.com", "platform.com"] {
            let (status, body) = send(
                &f.state,
                request(Method::GET, host, "/api/payments", None, None),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{host}");
            assert_eq!(body["code"], "TENANT_NOT_RESOLVED");
            assert_eq!(
                body["message"],
                "Unable to resolve organization for this host"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_session_is_unauthorized() {
        let f = fixture().await;
        let (status, body) = send(
            &f.state,
            request(Method::GET, "acme.platform.com", "/api/payments", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = send(
            &f.state,
            request(Method::GET, "acme.platform.com", "/api/payments", Some("garbage"), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_session_cookie_accepted() {
        let f = fixture().await;
        let token = token(&f.state, &Principal::member("u-admin", Role::Admin, f.acme));
        let request = Request::builder()
            .uri("/api/organization")
            .header(HOST, "acme.platform.com")
            .header("cookie", format!("theme=dark; commons_session={token}"))
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&f.state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["slug"], "acme");
        assert_eq!(body["data"]["resolved_via"], "subdomain");
    }

    #[tokio::test]
    async fn test_super_admin_on_tenant_host() {
        let f = fixture().await;
        let token = token(&f.state, &Principal::super_admin("ops-1"));

        let (status, body) = send(
            &f.state,
            request(Method::GET, "other.platform.com", "/api/payments", Some(&token), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["payments"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_stamps_tenant_id() {
        let f = fixture().await;
        let token = token(&f.state, &Principal::member("u-admin", Role::Admin, f.acme));

        let (status, body) = send(
            &f.state,
            request(
                Method::POST,
                "acme.platform.com",
                "/api/records/calendarevent",
                Some(&token),
                Some(json!({"title": "Pool party", "organizationId": f.other.to_string()})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["organizationId"], f.acme.to_string());
        assert_eq!(body["data"]["title"], "Pool party");
    }

    #[tokio::test]
    async fn test_payment_role_floors() {
        let f = fixture().await;
        let resident = token(&f.state, &Principal::member("u-acme-1", Role::Resident, f.acme));
        let board = token(&f.state, &Principal::member("u-board", Role::BoardMember, f.acme));
        let payment = json!({"user_id": "u-acme-1", "amount": 40.0, "due_date": "2026-03-01"});

        let (status, _) = send(
            &f.state,
            request(Method::POST, "acme.platform.com", "/api/payments", Some(&resident), Some(payment.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &f.state,
            request(Method::POST, "acme.platform.com", "/api/payments", Some(&board), Some(payment)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &f.state,
            request(Method::DELETE, "acme.platform.com", &format!("/api/payments/{id}"), Some(&board), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_generic_records_respect_role_floors() {
        let f = fixture().await;
        let resident = token(&f.state, &Principal::member("u-acme-1", Role::Resident, f.acme));
        let admin = token(&f.state, &Principal::member("u-admin", Role::Admin, f.acme));
        let host = "acme.platform.com";

        for (uri, body) in [
            ("/api/records/payment", json!({"amount": -500, "status": "PAID"})),
            ("/api/records/rolepermission", json!({"permission": "payments.delete"})),
            ("/api/records/user", json!({"email": "x@acme.org"})),
            ("/api/records/task", json!({"title": "Paint fence"})),
        ] {
            let (status, _) = send(
                &f.state,
                request(Method::POST, host, uri, Some(&resident), Some(body)),
            )
            .await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        }

        for uri in ["/api/records/payment", "/api/records/user", "/api/records/customrole"] {
            let (status, _) = send(&f.state, request(Method::GET, host, uri, Some(&resident), None)).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        }
        let (status, _) = send(
            &f.state,
            request(Method::GET, host, "/api/records/task", Some(&resident), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &f.state,
            request(
                Method::POST,
                host,
                "/api/records/payment",
                Some(&admin),
                Some(json!({"amount": 10, "status": "PAID"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &f.state,
            request(Method::GET, host, "/api/records/payment", Some(&admin), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_payment_guards_by_operation() {
        let f = fixture().await;
        let host = "acme.platform.com";
        let board = token(&f.state, &Principal::member("u-board", Role::BoardMember, f.acme));
        let admin = token(&f.state, &Principal::member("u-admin", Role::Admin, f.acme));
        let outsider = token(&f.state, &Principal::member("u-x", Role::Admin, f.other));
        let payment = json!({"user_id": "u-acme-2", "amount": 12.5, "due_date": "2026-04-01"});

        let (status, _) = send(
            &f.state,
            request(Method::POST, host, "/api/payments", None, Some(payment.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &f.state,
            request(Method::POST, host, "/api/payments", Some(&outsider), Some(payment.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(
            &f.state,
            request(Method::POST, host, "/api/payments", Some(&board), Some(payment)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let path = format!("/api/payments/{}", body["data"]["id"].as_str().unwrap());

        let (status, body) = send(
            &f.state,
            request(Method::PATCH, host, &path, Some(&board), Some(json!({"status": "paid"}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "PAID");

        let (status, _) = send(&f.state, request(Method::DELETE, host, &path, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&f.state, request(Method::DELETE, host, &path, Some(&admin), None)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_route_needs_only_a_session() {
        let f = fixture().await;
        let resident = Principal::member("u-acme-1", Role::Resident, f.acme).with_email("r@acme.org");
        let resident_token = token(&f.state, &resident);

        let (status, body) = send(
            &f.state,
            request(Method::GET, "platform.com", "/api/session", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        for host in ["platform.com", "other.platform.com", "www.platform.com"] {
            let (status, body) = send(
                &f.state,
                request(Method::GET, host, "/api/session", Some(&resident_token), None),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "{host}");
            assert_eq!(body["data"]["user_id"], "u-acme-1");
            assert_eq!(body["data"]["role"], "RESIDENT");
            assert_eq!(body["data"]["organization_id"], f.acme.to_string());
        }
    }

    #[tokio::test]
    async fn test_super_admin_names_organization_on_platform_host() {
        let f = fixture().await;
        let operator = token(&f.state, &Principal::super_admin("ops-1"));
        let other_admin = token(&f.state, &Principal::member("u-x", Role::Admin, f.other));
        let uri = format!("/api/organization?organizationId={}", f.acme);

        let (status, body) = send(
            &f.state,
            request(Method::GET, "platform.com", &uri, Some(&operator), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["slug"], "acme");
        assert_eq!(body["data"]["resolved_via"], "impersonation");

        let (status, body) = send(
            &f.state,
            request(
                Method::GET,
                "localhost:3000",
                &format!("/api/payments?organizationId={}", f.other),
                Some(&operator),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["payments"].as_array().unwrap().len(), 1);

        // Only super-admins may name an organization.
        let (status, body) = send(
            &f.state,
            request(Method::GET, "platform.com", &uri, Some(&other_admin), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "TENANT_NOT_RESOLVED");

        // Tenant hosts keep their own organization.
        let (status, body) = send(
            &f.state,
            request(Method::GET, "other.platform.com", &uri, Some(&operator), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["slug"], "other");

        let missing = format!("/api/organization?organizationId={}", OrganizationId::new());
        let (status, _) = send(
            &f.state,
            request(Method::GET, "platform.com", &missing, Some(&operator), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_error_body_carries_request_id() {
        let f = fixture().await;
        let request = Request::builder()
            .uri("/api/payments")
            .header(HOST, "www.platform.com")
            .header(&REQUEST_ID_HEADER, "req-42")
            .body(Body::empty())
            .unwrap();

        let response = create_router(Arc::clone(&f.state))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[&REQUEST_ID_HEADER], "req-42");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["request_id"], "req-42");
    }

    #[tokio::test]
    async fn test_admin_routes_require_super_admin() {
        let f = fixture().await;
        let tenant_admin = token(&f.state, &Principal::member("u-admin", Role::Admin, f.acme));

        let (status, _) = send(
            &f.state,
            request(Method::GET, "platform.com", "/api/admin/organizations", None, None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &f.state,
            request(Method::GET, "platform.com", "/api/admin/organizations", Some(&tenant_admin), None),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let operator = token(&f.state, &Principal::super_admin("ops-1"));
        let (status, body) = send(
            &f.state,
            request(Method::GET, "platform.com", "/api/admin/organizations", Some(&operator), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn test_custom_domain_resolves_once_verified() {
        let f = fixture().await;
        let operator = token(&f.state, &Principal::super_admin("ops-1"));
        let member = token(&f.state, &Principal::member("u-admin", Role::Admin, f.acme));
        let domains = format!("/api/admin/domains/{}", f.acme);

        let (status, body) = send(
            &f.state,
            request(
                Method::PUT,
                "platform.com",
                &domains,
                Some(&operator),
                Some(json!({"custom_domain": "board.acme.org"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token_value = body["data"]["custom_domain"]["verification"]["value"]
            .as_str()
            .unwrap()
            .to_string();

        let (status, _) = send(
            &f.state,
            request(Method::GET, "board.acme.org", "/api/organization", Some(&member), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &f.state,
            request(
                Method::POST,
                "platform.com",
                &format!("{domains}/verify"),
                Some(&operator),
                Some(json!({"token": token_value})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &f.state,
            request(Method::GET, "board.acme.org", "/api/organization", Some(&member), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["resolved_via"], "custom_domain");
        assert_eq!(body["data"]["url"], "https://board.acme.org");
    }

    #[tokio::test]
    async fn test_suspended_organization_stops_resolving() {
        let f = fixture().await;
        let operator = token(&f.state, &Principal::super_admin("ops-1"));
        let member = token(&f.state, &Principal::member("u-admin", Role::Admin, f.acme));

        let (status, _) = send(
            &f.state,
            request(
                Method::POST,
                "platform.com",
                &format!("/api/admin/organizations/{}/suspend", f.acme),
                Some(&operator),
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &f.state,
            request(Method::GET, "acme.platform.com", "/api/organization", Some(&member), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "TENANT_NOT_RESOLVED");
    }

    async fn preflight(f: &Fixture, origin: &str) -> Response<Body> {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/payments")
            .header(HOST, "acme.platform.com")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        create_router(Arc::clone(&f.state))
            .oneshot(request)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cors_wildcard_never_allows_credentials() {
        let mut config = ApiConfig::default();
        config.cors.allow_credentials = true;
        let f = fixture_with(config).await;

        let response = preflight(&f, "https://anywhere.example").await;
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert!(headers.get("access-control-allow-credentials").is_none());
    }

    #[tokio::test]
    async fn test_cors_explicit_origins_allow_credentials() {
        let mut config = ApiConfig::default();
        config.cors.allowed_origins = vec!["https://acme.platform.com".to_string()];
        config.cors.allow_credentials = true;
        let f = fixture_with(config).await;

        let response = preflight(&f, "https://acme.platform.com").await;
        let headers = response.headers();
        assert_eq!(
            headers["access-control-allow-origin"],
            "https://acme.platform.com"
        );
        assert_eq!(headers["access-control-allow-credentials"], "true");

        let response = preflight(&f, "https://evil.example").await;
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_cors_disabled_adds_no_headers() {
        let mut config = ApiConfig::default();
        config.cors.enabled = false;
        let f = fixture_with(config).await;

        let response = preflight(&f, "https://anywhere.example").await;
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }
}
