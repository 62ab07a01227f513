//! Query execution: the executor seam, an in-memory store and the
//! per-request scoped client.

use super::entity::Entity;
use super::middleware::TenantScope;
use super::query::{Action, Filter, ID_FIELD, ORGANIZATION_ID_FIELD, Payload, Query, Record};
use crate::error::{Result, SecurityError};
use async_trait::async_trait;
use commons_telemetry::spans::scoped_query_span;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug};
use uuid::Uuid;

/// Result of executing a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// `findMany`
    Records(Vec<Record>),
    /// `findFirst`, `findUnique`, `create`, `update`, `delete`
    Record(Option<Record>),
    /// `count`, and the affected row count of bulk writes
    Count(u64),
}

impl QueryOutput {
    /// Returns the records carried by this output.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        match self {
            Self::Records(records) => records,
            Self::Record(Some(record)) => std::slice::from_ref(record),
            Self::Record(None) | Self::Count(_) => &[],
        }
    }

    /// Converts into a list of records.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Self::Records(records) => records,
            Self::Record(record) => record.into_iter().collect(),
            Self::Count(_) => Vec::new(),
        }
    }

    /// Converts into a single optional record.
    #[must_use]
    pub fn into_record(self) -> Option<Record> {
        match self {
            Self::Records(records) => records.into_iter().next(),
            Self::Record(record) => record,
            Self::Count(_) => None,
        }
    }

    /// Returns the count, if this is a count.
    #[must_use]
    pub const fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }
}

/// Executes queries against a backing store.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Executes one query as given. Implementations do not add tenant scoping.
    async fn execute(&self, query: Query) -> Result<QueryOutput>;
}

/// In-process store keeping each entity's records in insertion order.
///
/// Tenant-scoped entities enforce a non-null string `organizationId`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Entity, Vec<Record>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records of an entity, across all tenants.
    #[must_use]
    pub fn len(&self, entity: Entity) -> usize {
        self.tables.read().get(&entity).map_or(0, Vec::len)
    }

    fn check_constraints(entity: Entity, record: &Record) -> Result<()> {
        if entity.is_tenant_scoped()
            && !matches!(record.get(ORGANIZATION_ID_FIELD), Some(Value::String(_)))
        {
            return Err(SecurityError::data_constraint(
                entity.as_str(),
                format!("{ORGANIZATION_ID_FIELD} must be a non-null string"),
            ));
        }
        Ok(())
    }

    fn prepare_insert(entity: Entity, table: &[Record], mut record: Record) -> Result<Record> {
        Self::check_constraints(entity, &record)?;
        match record.get(ID_FIELD) {
            None | Some(Value::Null) => {
                record.insert(
                    ID_FIELD.to_string(),
                    Value::String(Uuid::new_v4().to_string()),
                );
            }
            Some(id) => {
                if table.iter().any(|r| r.get(ID_FIELD) == Some(id)) {
                    return Err(SecurityError::data_constraint(
                        entity.as_str(),
                        format!("duplicate {ID_FIELD} {id}"),
                    ));
                }
            }
        }
        Ok(record)
    }

    fn patched(entity: Entity, original: &Record, patch: &Record) -> Result<Record> {
        let mut updated = original.clone();
        for (field, value) in patch {
            if field == ID_FIELD {
                continue;
            }
            updated.insert(field.clone(), value.clone());
        }
        Self::check_constraints(entity, &updated)?;
        Ok(updated)
    }

    fn single_payload(query: &Query) -> Result<&Record> {
        match &query.data {
            Payload::One(record) => Ok(record),
            _ => Err(SecurityError::invalid_query(format!(
                "{} requires exactly one record",
                query.action
            ))),
        }
    }

    fn not_found(query: &Query) -> SecurityError {
        let id = match &query.filter {
            Filter::Eq { field, value } if field == ID_FIELD => value.to_string(),
            _ => query
                .filter
                .clone()
                .into_conjuncts()
                .into_iter()
                .find_map(|f| match f {
                    Filter::Eq { field, value } if field == ID_FIELD => Some(value.to_string()),
                    _ => None,
                })
                .unwrap_or_else(|| "matching filter".to_string()),
        };
        SecurityError::record_not_found(query.entity.as_str(), id.trim_matches('"'))
    }
}

#[async_trait]
impl QueryExecutor for MemoryStore {
    async fn execute(&self, query: Query) -> Result<QueryOutput> {
        let entity = query.entity;
        let filter = &query.filter;

        let output = match query.action {
            Action::FindMany => {
                let tables = self.tables.read();
                let rows = tables.get(&entity).map_or(&[][..], Vec::as_slice);
                QueryOutput::Records(rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            }
            Action::FindFirst | Action::FindUnique => {
                let tables = self.tables.read();
                let rows = tables.get(&entity).map_or(&[][..], Vec::as_slice);
                QueryOutput::Record(rows.iter().find(|r| filter.matches(r)).cloned())
            }
            Action::Count => {
                let tables = self.tables.read();
                let rows = tables.get(&entity).map_or(&[][..], Vec::as_slice);
                QueryOutput::Count(rows.iter().filter(|r| filter.matches(r)).count() as u64)
            }
            Action::Create => {
                let record = Self::single_payload(&query)?.clone();
                let mut tables = self.tables.write();
                let table = tables.entry(entity).or_default();
                let record = Self::prepare_insert(entity, table, record)?;
                table.push(record.clone());
                QueryOutput::Record(Some(record))
            }
            Action::CreateMany => {
                let Payload::Many(records) = &query.data else {
                    return Err(SecurityError::invalid_query(
                        "createMany requires a list of records",
                    ));
                };
                let mut tables = self.tables.write();
                let table = tables.entry(entity).or_default();
                // All or nothing.
                let mut staged: Vec<Record> = Vec::with_capacity(records.len());
                for record in records {
                    let mut existing = table.clone();
                    existing.extend(staged.iter().cloned());
                    staged.push(Self::prepare_insert(entity, &existing, record.clone())?);
                }
                let count = staged.len() as u64;
                table.extend(staged);
                QueryOutput::Count(count)
            }
            Action::Update => {
                let patch = Self::single_payload(&query)?;
                let mut tables = self.tables.write();
                let table = tables.entry(entity).or_default();
                let Some(row) = table.iter_mut().find(|r| filter.matches(r)) else {
                    return Err(Self::not_found(&query));
                };
                let updated = Self::patched(entity, row, patch)?;
                *row = updated.clone();
                QueryOutput::Record(Some(updated))
            }
            Action::UpdateMany => {
                let patch = Self::single_payload(&query)?;
                let mut tables = self.tables.write();
                let table = tables.entry(entity).or_default();
                let mut updates = Vec::new();
                for (index, row) in table.iter().enumerate() {
                    if filter.matches(row) {
                        updates.push((index, Self::patched(entity, row, patch)?));
                    }
                }
                let count = updates.len() as u64;
                for (index, updated) in updates {
                    table[index] = updated;
                }
                QueryOutput::Count(count)
            }
            Action::Delete => {
                let mut tables = self.tables.write();
                let table = tables.entry(entity).or_default();
                let Some(index) = table.iter().position(|r| filter.matches(r)) else {
                    return Err(Self::not_found(&query));
                };
                QueryOutput::Record(Some(table.remove(index)))
            }
            Action::DeleteMany => {
                let mut tables = self.tables.write();
                let table = tables.entry(entity).or_default();
                let before = table.len();
                table.retain(|r| !filter.matches(r));
                QueryOutput::Count((before - table.len()) as u64)
            }
        };

        debug!(entity = %entity, action = %query.action, "Executed query");
        Ok(output)
    }
}

/// Data access bound to one request's tenant.
///
/// Every query passes through [`TenantScope::apply`] before it reaches the
/// executor, and results through [`TenantScope::validate`] on the way back.
#[derive(Clone)]
pub struct ScopedClient {
    executor: Arc<dyn QueryExecutor>,
    scope: TenantScope,
}

impl std::fmt::Debug for ScopedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedClient")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl ScopedClient {
    /// Binds an executor to a scope.
    #[must_use]
    pub fn new(executor: Arc<dyn QueryExecutor>, scope: TenantScope) -> Self {
        Self { executor, scope }
    }

    /// Returns the scope.
    #[must_use]
    pub const fn scope(&self) -> &TenantScope {
        &self.scope
    }

    /// Scopes, executes and validates a query.
    pub async fn execute(&self, query: Query) -> Result<QueryOutput> {
        let query = self.scope.apply(query);
        let entity = query.entity;
        let span = scoped_query_span(
            entity.as_str(),
            query.action.as_str(),
            &self.scope.organization_id().to_string(),
        );

        let output = self.executor.execute(query).instrument(span).await?;
        self.scope.validate(entity, output.records())?;
        Ok(output)
    }

    /// All matching records.
    pub async fn find_many(&self, entity: Entity, filter: Filter) -> Result<Vec<Record>> {
        Ok(self
            .execute(Query::find_many(entity, filter))
            .await?
            .into_records())
    }

    /// The record with the given id, or `RecordNotFound`.
    pub async fn find_unique(&self, entity: Entity, id: &str) -> Result<Record> {
        self.execute(Query::find_unique(entity, id))
            .await?
            .into_record()
            .ok_or_else(|| SecurityError::record_not_found(entity.as_str(), id))
    }

    /// Number of matching records.
    pub async fn count(&self, entity: Entity, filter: Filter) -> Result<u64> {
        Ok(self
            .execute(Query::count(entity, filter))
            .await?
            .count()
            .unwrap_or_default())
    }

    /// Inserts one record.
    pub async fn create(&self, entity: Entity, record: Record) -> Result<Record> {
        self.execute(Query::create(entity, record))
            .await?
            .into_record()
            .ok_or_else(|| SecurityError::invalid_query("create returned no record"))
    }

    /// Patches the record with the given id.
    pub async fn update(&self, entity: Entity, id: &str, patch: Record) -> Result<Record> {
        self.execute(Query::update(entity, id, patch))
            .await?
            .into_record()
            .ok_or_else(|| SecurityError::record_not_found(entity.as_str(), id))
    }

    /// Removes the record with the given id.
    pub async fn delete(&self, entity: Entity, id: &str) -> Result<Record> {
        self.execute(Query::delete(entity, id))
            .await?
            .into_record()
            .ok_or_else(|| SecurityError::record_not_found(entity.as_str(), id))
    }
}
