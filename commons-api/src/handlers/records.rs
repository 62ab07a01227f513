//! Generic tenant-scoped record access.
//!
//! Reads are open to every member except for personal and privilege
//! records, which only admins may list. Writes are mounted behind the
//! admin guard and never reach entities that have their own endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use commons_security::access::Role;
use commons_security::scope::{Entity, Filter, Record};

use crate::error::{ApiError, ApiResult};
use crate::middleware::{Auth, Tenant};
use crate::response::{ApiResponse, CreatedResponse};
use crate::state::AppState;

/// Parses the path segment into a tenant-scoped entity.
///
/// Global entities are not reachable through tenant routes.
fn scoped_entity(name: &str) -> ApiResult<Entity> {
    let entity: Entity = name.parse().map_err(ApiError::from)?;
    if !entity.is_tenant_scoped() {
        return Err(ApiError::BadRequest(format!(
            "{entity} is not available on tenant routes"
        )));
    }
    Ok(entity)
}

/// Entities written only through their own endpoints, which apply
/// validation and visibility rules of their own.
const fn has_dedicated_api(entity: Entity) -> bool {
    matches!(entity, Entity::Payment | Entity::User)
}

/// Personal or privilege records only admins may list here.
const fn is_restricted(entity: Entity) -> bool {
    matches!(
        entity,
        Entity::Payment
            | Entity::User
            | Entity::CustomRole
            | Entity::RolePermission
            | Entity::UserCustomRole
    )
}

/// Query-string parameters become equality conditions. Values that parse
/// as JSON (numbers, booleans, null) are compared as such.
fn filter_from_params(params: BTreeMap<String, String>) -> Filter {
    let fields: Record = params
        .into_iter()
        .map(|(field, raw)| {
            let value = serde_json::from_str::<Value>(&raw)
                .ok()
                .filter(|v| !v.is_object() && !v.is_array())
                .unwrap_or(Value::String(raw));
            (field, value)
        })
        .collect();
    Filter::from_fields(&fields)
}

/// List records of an entity for the current organization.
///
/// GET /api/records/{entity}
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Auth(auth): Auth,
    Path(entity): Path<String>,
    Query(params): Query<BTreeMap<String, String>>,
) -> ApiResult<ApiResponse<Vec<Record>>> {
    let entity = scoped_entity(&entity)?;
    if is_restricted(entity) {
        auth.require_role(Role::Admin)?;
    }
    let records = state
        .scoped_client(&tenant)
        .find_many(entity, filter_from_params(params))
        .await?;
    Ok(ApiResponse::success(records))
}

/// Create a record of an entity for the current organization. Admins only.
///
/// POST /api/records/{entity}
pub async fn create_record(
    State(state): State<Arc<AppState>>,
    Tenant(tenant): Tenant,
    Auth(auth): Auth,
    Path(entity): Path<String>,
    Json(record): Json<Record>,
) -> ApiResult<CreatedResponse<Record>> {
    auth.require_role(Role::Admin)?;
    let entity = scoped_entity(&entity)?;
    if has_dedicated_api(entity) {
        return Err(ApiError::BadRequest(format!(
            "{entity} records are managed through their own endpoints"
        )));
    }
    let created = state
        .scoped_client(&tenant)
        .create(entity, record)
        .await?;
    Ok(CreatedResponse::new(created))
}
