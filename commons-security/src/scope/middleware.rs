//! Tenant scoping of queries and results.

use super::query::{Filter, ORGANIZATION_ID_FIELD, Payload, Query, Record};
use super::entity::Entity;
use crate::error::{Result, SecurityError};
use crate::tenant::{OrganizationId, TenantContext};
use serde_json::Value;
use tracing::warn;

/// Binds queries to one organization.
///
/// Tenant-scoped entities get the organization constraint on every filter
/// and the organization id on every written record. Global entities pass
/// through untouched.
#[derive(Debug, Clone)]
pub struct TenantScope {
    organization_id: OrganizationId,
    validate_results: bool,
}

impl TenantScope {
    /// Creates a scope for the given organization, validating results.
    #[must_use]
    pub const fn new(organization_id: OrganizationId) -> Self {
        Self {
            organization_id,
            validate_results: true,
        }
    }

    /// Creates a scope for the request's tenant.
    #[must_use]
    pub fn from_context(context: &TenantContext) -> Self {
        Self::new(context.organization_id())
    }

    /// Enables or disables result validation.
    #[must_use]
    pub const fn with_result_validation(mut self, enabled: bool) -> Self {
        self.validate_results = enabled;
        self
    }

    /// Returns the scoped organization.
    #[must_use]
    pub const fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    fn organization_value(&self) -> Value {
        Value::String(self.organization_id.to_string())
    }

    /// Rewrites a query so it can only touch this organization's records.
    ///
    /// Caller-supplied top-level `organizationId` equalities are discarded.
    /// Applying twice yields the same query as applying once.
    #[must_use]
    pub fn apply(&self, mut query: Query) -> Query {
        if !query.entity.is_tenant_scoped() {
            return query;
        }

        if query.action.uses_filter() {
            let filter = std::mem::take(&mut query.filter);
            query.filter = self.scope_filter(filter);
        }

        if query.action.is_create() || query.action.is_update() {
            let data = std::mem::take(&mut query.data);
            query.data = self.stamp_payload(data);
        }

        query
    }

    fn scope_filter(&self, filter: Filter) -> Filter {
        let mut conjuncts = vec![Filter::equals(
            ORGANIZATION_ID_FIELD,
            self.organization_value(),
        )];
        conjuncts.extend(
            filter
                .into_conjuncts()
                .into_iter()
                .filter(|f| !f.is_eq_on(ORGANIZATION_ID_FIELD)),
        );
        Filter::and(conjuncts)
    }

    fn stamp(&self, mut record: Record) -> Record {
        record.insert(ORGANIZATION_ID_FIELD.to_string(), self.organization_value());
        record
    }

    fn stamp_payload(&self, data: Payload) -> Payload {
        match data {
            Payload::None => Payload::One(self.stamp(Record::new())),
            Payload::One(record) => Payload::One(self.stamp(record)),
            Payload::Many(records) => {
                Payload::Many(records.into_iter().map(|r| self.stamp(r)).collect())
            }
        }
    }

    /// Rejects results belonging to another organization.
    ///
    /// A no-op for global entities or when validation is disabled.
    pub fn validate(&self, entity: Entity, records: &[Record]) -> Result<()> {
        if !self.validate_results || !entity.is_tenant_scoped() {
            return Ok(());
        }

        let expected = self.organization_id.to_string();
        for record in records {
            let owner = record.get(ORGANIZATION_ID_FIELD).and_then(Value::as_str);
            if owner != Some(expected.as_str()) {
                warn!(
                    entity = %entity,
                    expected = %expected,
                    found = ?owner,
                    "Tenant isolation violation in query result"
                );
                return Err(SecurityError::tenant_isolation_violation(format!(
                    "{entity} record does not belong to organization {expected}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::query::{Action, ID_FIELD};
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn scope() -> TenantScope {
        TenantScope::new(OrganizationId::new())
    }

    #[test]
    fn test_read_gets_tenant_constraint_first() {
        let scope = scope();
        let query = scope.apply(Query::find_many(
            Entity::Payment,
            Filter::equals("status", "paid"),
        ));

        let Filter::And { filters } = &query.filter else {
            panic!("expected conjunction, got {:?}", query.filter);
        };
        assert_eq!(
            filters[0],
            Filter::equals(ORGANIZATION_ID_FIELD, scope.organization_id().to_string())
        );
        assert_eq!(filters[1], Filter::equals("status", "paid"));
    }

    #[test]
    fn test_caller_organization_id_is_discarded() {
        let scope = scope();
        let other = OrganizationId::new().to_string();
        let query = scope.apply(Query::find_many(
            Entity::Payment,
            Filter::and(vec![
                Filter::equals(ORGANIZATION_ID_FIELD, other.clone()),
                Filter::equals("status", "paid"),
            ]),
        ));

        let mine = record(json!({"organizationId": scope.organization_id().to_string(), "status": "paid"}));
        let theirs = record(json!({"organizationId": other, "status": "paid"}));
        assert!(query.filter.matches(&mine));
        assert!(!query.filter.matches(&theirs));
    }

    #[test]
    fn test_or_cannot_escape_scope() {
        let scope = scope();
        let other = OrganizationId::new().to_string();
        let query = scope.apply(Query::find_many(
            Entity::Message,
            Filter::or(vec![
                Filter::equals(ORGANIZATION_ID_FIELD, other.clone()),
                Filter::All,
            ]),
        ));
        let theirs = record(json!({"organizationId": other}));
        assert!(!query.filter.matches(&theirs));
    }

    #[test]
    fn test_apply_is_idempotent() {
        let scope = scope();
        let queries = vec![
            Query::find_many(Entity::Payment, Filter::All),
            Query::find_unique(Entity::Document, "d1"),
            Query::count(
                Entity::Task,
                Filter::and(vec![Filter::equals("done", false), Filter::and(vec![])]),
            ),
            Query::create(Entity::Pet, record(json!({"name": "Rex"}))),
            Query::create_many(Entity::Pet, vec![record(json!({"name": "A"})), Record::new()]),
            Query::update(Entity::Invoice, "i1", record(json!({"paid": true}))),
            Query::delete_many(Entity::Note, Filter::not(Filter::equals("pinned", true))),
            Query::find_many(Entity::Organization, Filter::equals("slug", "acme")),
        ];
        for query in queries {
            let once = scope.apply(query);
            let twice = scope.apply(once.clone());
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_creates_always_carry_tenant_id() {
        let scope = scope();
        let mine = Value::String(scope.organization_id().to_string());
        let forged = OrganizationId::new().to_string();

        let query = scope.apply(Query::create(
            Entity::Payment,
            record(json!({"amount": 10, "organizationId": forged})),
        ));
        let Payload::One(created) = &query.data else {
            panic!("expected one record");
        };
        assert_eq!(created[ORGANIZATION_ID_FIELD], mine);

        let query = scope.apply(Query::create_many(
            Entity::Payment,
            vec![
                record(json!({"amount": 1})),
                record(json!({"amount": 2, "organizationId": null})),
                record(json!({"amount": 3, "organizationId": forged})),
            ],
        ));
        let Payload::Many(created) = &query.data else {
            panic!("expected many records");
        };
        assert!(created.iter().all(|r| r[ORGANIZATION_ID_FIELD] == mine));
    }

    #[test]
    fn test_update_payload_overwritten() {
        let scope = scope();
        let query = scope.apply(Query::update(
            Entity::Vendor,
            "v1",
            record(json!({"organizationId": OrganizationId::new().to_string()})),
        ));
        let Payload::One(patch) = &query.data else {
            panic!("expected patch");
        };
        assert_eq!(
            patch[ORGANIZATION_ID_FIELD],
            Value::String(scope.organization_id().to_string())
        );
        assert_eq!(query.action, Action::Update);
    }

    #[test]
    fn test_every_entity_is_scoped_or_passed_through() {
        let scope = scope();
        let mine = Value::String(scope.organization_id().to_string());
        let forged = OrganizationId::new().to_string();
        let scoped_filter = |caller: Filter| {
            Filter::and(vec![
                Filter::equals(ORGANIZATION_ID_FIELD, mine.clone()),
                caller,
            ])
        };

        let mut globals = Vec::new();
        for entity in Entity::ALL {
            let queries = [
                Query::find_many(entity, Filter::equals("status", "open")),
                Query::count(entity, Filter::equals(ORGANIZATION_ID_FIELD, forged.clone())),
                Query::create(entity, record(json!({"organizationId": forged}))),
                Query::create_many(entity, vec![Record::new(), record(json!({"organizationId": forged}))]),
                Query::update(entity, "r1", record(json!({"organizationId": forged}))),
                Query::delete_many(entity, Filter::equals("status", "open")),
            ];

            if !entity.is_tenant_scoped() {
                for query in queries {
                    assert_eq!(scope.apply(query.clone()), query, "{entity}");
                }
                globals.push(entity);
                continue;
            }

            let [find, count, create, create_many, update, delete] = queries.map(|q| scope.apply(q));

            assert_eq!(find.filter, scoped_filter(Filter::equals("status", "open")), "{entity}");
            assert_eq!(delete.filter, scoped_filter(Filter::equals("status", "open")), "{entity}");
            assert_eq!(
                count.filter,
                Filter::and(vec![Filter::equals(ORGANIZATION_ID_FIELD, mine.clone())]),
                "{entity}"
            );
            assert_eq!(update.filter, scoped_filter(Filter::equals(ID_FIELD, "r1")), "{entity}");

            let Payload::One(created) = &create.data else {
                panic!("{entity}: expected one record");
            };
            assert_eq!(created[ORGANIZATION_ID_FIELD], mine, "{entity}");
            let Payload::Many(created) = &create_many.data else {
                panic!("{entity}: expected many records");
            };
            assert!(created.iter().all(|r| r[ORGANIZATION_ID_FIELD] == mine), "{entity}");
            let Payload::One(patch) = &update.data else {
                panic!("{entity}: expected patch");
            };
            assert_eq!(patch[ORGANIZATION_ID_FIELD], mine, "{entity}");
        }

        globals.sort();
        assert_eq!(
            globals,
            vec![Entity::Organization, Entity::Account, Entity::VerificationToken]
        );
    }

    #[test]
    fn test_global_entities_untouched() {
        let scope = scope();
        let query = Query::find_many(Entity::Account, Filter::equals("provider", "google"));
        assert_eq!(scope.apply(query.clone()), query);
    }

    #[test]
    fn test_validate_results() {
        let scope = scope();
        let mine = record(json!({"organizationId": scope.organization_id().to_string()}));
        let theirs = record(json!({"organizationId": OrganizationId::new().to_string()}));
        let orphan = record(json!({"id": "x"}));

        assert!(scope.validate(Entity::Payment, &[mine.clone()]).is_ok());
        assert!(matches!(
            scope.validate(Entity::Payment, &[mine.clone(), theirs.clone()]),
            Err(SecurityError::TenantIsolationViolation { .. })
        ));
        assert!(scope.validate(Entity::Payment, &[orphan]).is_err());
        assert!(scope.validate(Entity::Organization, &[theirs.clone()]).is_ok());

        let lenient = scope.with_result_validation(false);
        assert!(lenient.validate(Entity::Payment, &[theirs]).is_ok());
    }
}
