//! Payment handlers.
//!
//! Every query goes through the tenant-scoped client; residents additionally
//! only see their own payments.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

use commons_security::access::{Authorized, Role};
use commons_security::scope::{Entity, Filter, ID_FIELD, Record};

use crate::error::{ApiError, ApiResult};
use crate::middleware::{Auth, Tenant};
use crate::response::{ApiResponse, CreatedResponse};
use crate::state::AppState;

const USER_ID: &str = "userId";
const STATUS: &str = "status";
const AMOUNT: &str = "amount";
const DUE_DATE: &str = "dueDate";

const STAFF_PAGE_SIZE: usize = 50;
const RESIDENT_PAGE_SIZE: usize = 20;

/// Payment status values.
pub mod status {
    /// Awaiting payment.
    pub const PENDING: &str = "PENDING";
    /// Settled.
    pub const PAID: &str = "PAID";
    /// Past the due date.
    pub const OVERDUE: &str = "OVERDUE";
}

/// List payments query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListPaymentsQuery {
    /// Filter by status
    pub status: Option<String>,
}

/// Payment totals for the caller's view.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct PaymentStats {
    /// Sum of paid amounts
    pub total_paid: f64,
    /// Sum of pending amounts
    pub current_due: f64,
    /// Number of overdue payments
    pub overdue_count: usize,
}

impl PaymentStats {
    fn from_records(records: &[Record]) -> Self {
        let mut stats = Self::default();
        for record in records {
            let amount = record.get(AMOUNT).and_then(Value::as_f64).unwrap_or(0.0);
            match record.get(STATUS).and_then(Value::as_str) {
                Some(status::PAID) => stats.total_paid += amount,
                Some(status::PENDING) => stats.current_due += amount,
                Some(status::OVERDUE) => stats.overdue_count += 1,
                _ => {}
            }
        }
        stats
    }
}

/// Payments list with totals.
#[derive(Debug, Serialize)]
pub struct PaymentsOverview {
    /// Most recent payments first
    pub payments: Vec<Record>,
    /// Totals over every payment visible to the caller
    pub stats: PaymentStats,
}

/// Create payment request.
#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Resident being charged
    pub user_id: String,
    /// Amount
    pub amount: f64,
    /// Due date (ISO 8601)
    pub due_date: String,
    /// Description
    pub description: Option<String>,
    /// Initial status
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    status::PENDING.to_string()
}

fn is_staff(auth: &Authorized) -> bool {
    auth.principal().role.at_least(Role::BoardMember)
}

/// Residents only see payments charged to them.
fn visibility_filter(auth: &Authorized) -> Filter {
    if is_staff(auth) {
        Filter::All
    } else {
        Filter::equals(USER_ID, auth.principal().user_id.clone())
    }
}

fn parse_status(value: &str) -> ApiResult<&'static str> {
    match value.to_ascii_uppercase().as_str() {
        "PENDING" => Ok(status::PENDING),
        "PAID" => Ok(status::PAID),
        "OVERDUE" => Ok(status::OVERDUE),
        _ => Err(ApiError::BadRequest(format!("Invalid payment status: {value}"))),
    }
}

/// List payments of the current organization.
///
/// GET /api/payments
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Auth(auth): Auth,
    Query(query): Query<ListPaymentsQuery>,
) -> ApiResult<ApiResponse<PaymentsOverview>> {
    let client = state.scoped_client(&tenant);
    let visible = client
        .find_many(Entity::Payment, visibility_filter(&auth))
        .await?;

    let stats = PaymentStats::from_records(&visible);

    let wanted = query.status.as_deref().map(parse_status).transpose()?;
    let mut payments: Vec<Record> = visible
        .into_iter()
        .filter(|p| wanted.is_none_or(|s| p.get(STATUS).and_then(Value::as_str) == Some(s)))
        .collect();
    payments.sort_by(|a, b| {
        let a = a.get(DUE_DATE).and_then(Value::as_str).unwrap_or_default();
        let b = b.get(DUE_DATE).and_then(Value::as_str).unwrap_or_default();
        b.cmp(a)
    });
    payments.truncate(if is_staff(&auth) {
        STAFF_PAGE_SIZE
    } else {
        RESIDENT_PAGE_SIZE
    });

    Ok(ApiResponse::success(PaymentsOverview { payments, stats }))
}

/// Record a payment. Board members and above.
///
/// POST /api/payments
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Auth(auth): Auth,
    Json(request): Json<CreatePaymentRequest>,
) -> ApiResult<CreatedResponse<Record>> {
    auth.require_role(Role::BoardMember)?;

    if request.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(ApiError::BadRequest("amount must be positive".to_string()));
    }
    let status = parse_status(&request.status)?;

    let mut record = Record::new();
    record.insert(USER_ID.to_string(), json!(request.user_id));
    record.insert(AMOUNT.to_string(), json!(request.amount));
    record.insert(DUE_DATE.to_string(), json!(request.due_date));
    record.insert(STATUS.to_string(), json!(status));
    if let Some(description) = request.description {
        record.insert("description".to_string(), json!(description));
    }

    let created = state
        .scoped_client(&tenant)
        .create(Entity::Payment, record)
        .await?;
    Ok(CreatedResponse::new(created))
}

/// Get one payment.
///
/// GET /api/payments/{id}
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Auth(auth): Auth,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Record>> {
    let payment = state
        .scoped_client(&tenant)
        .find_unique(Entity::Payment, &id)
        .await?;

    if !visibility_filter(&auth).matches(&payment) {
        return Err(ApiError::NotFound("Payment not found".to_string()));
    }
    Ok(ApiResponse::success(payment))
}

/// Patch a payment. Board members and above.
///
/// PATCH /api/payments/{id}
pub async fn update_payment(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Auth(auth): Auth,
    Path(id): Path<String>,
    Json(mut patch): Json<Record>,
) -> ApiResult<ApiResponse<Record>> {
    auth.require_role(Role::BoardMember)?;

    patch.remove(ID_FIELD);
    if let Some(value) = patch.get(STATUS) {
        let status = value
            .as_str()
            .ok_or_else(|| ApiError::BadRequest("status must be a string".to_string()))
            .and_then(parse_status)?;
        patch.insert(STATUS.to_string(), json!(status));
    }

    let updated = state
        .scoped_client(&tenant)
        .update(Entity::Payment, &id, patch)
        .await?;
    Ok(ApiResponse::success(updated))
}

/// Delete a payment. Admins only.
///
/// DELETE /api/payments/{id}
pub async fn delete_payment(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Auth(auth): Auth,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Record>> {
    auth.require_role(Role::Admin)?;

    let deleted = state
        .scoped_client(&tenant)
        .delete(Entity::Payment, &id)
        .await?;
    Ok(ApiResponse::success_with_message(deleted, "Payment deleted"))
}
