//! Query model for data access.

use super::entity::Entity;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A persisted record: a JSON object.
pub type Record = serde_json::Map<String, Value>;

/// Column holding the owning organization of tenant-scoped records.
pub const ORGANIZATION_ID_FIELD: &str = "organizationId";

/// Primary key column.
pub const ID_FIELD: &str = "id";

/// Data-access operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// All matching records.
    FindMany,
    /// First matching record.
    FindFirst,
    /// The record matching a unique filter.
    FindUnique,
    /// Number of matching records.
    Count,
    /// Insert one record.
    Create,
    /// Insert several records.
    CreateMany,
    /// Patch the first matching record.
    Update,
    /// Patch every matching record.
    UpdateMany,
    /// Remove the first matching record.
    Delete,
    /// Remove every matching record.
    DeleteMany,
}

impl Action {
    /// Returns the action name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FindMany => "findMany",
            Self::FindFirst => "findFirst",
            Self::FindUnique => "findUnique",
            Self::Count => "count",
            Self::Create => "create",
            Self::CreateMany => "createMany",
            Self::Update => "update",
            Self::UpdateMany => "updateMany",
            Self::Delete => "delete",
            Self::DeleteMany => "deleteMany",
        }
    }

    /// Returns true for inserts.
    #[must_use]
    pub const fn is_create(&self) -> bool {
        matches!(self, Self::Create | Self::CreateMany)
    }

    /// Returns true for patches.
    #[must_use]
    pub const fn is_update(&self) -> bool {
        matches!(self, Self::Update | Self::UpdateMany)
    }

    /// Returns true for actions selecting existing records through a filter.
    #[must_use]
    pub const fn uses_filter(&self) -> bool {
        !self.is_create()
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean record filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Filter {
    /// Matches every record.
    #[default]
    All,
    /// `field == value`; a missing field equals `null`.
    Eq {
        /// Field name.
        field: String,
        /// Expected value.
        value: Value,
    },
    /// Every sub-filter matches.
    And {
        /// Conjuncts.
        filters: Vec<Filter>,
    },
    /// At least one sub-filter matches.
    Or {
        /// Disjuncts.
        filters: Vec<Filter>,
    },
    /// The sub-filter does not match.
    Not {
        /// Negated filter.
        filter: Box<Filter>,
    },
}

impl Filter {
    /// `field == value`
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Conjunction.
    #[must_use]
    pub fn and(filters: Vec<Self>) -> Self {
        Self::And { filters }
    }

    /// Disjunction.
    #[must_use]
    pub fn or(filters: Vec<Self>) -> Self {
        Self::Or { filters }
    }

    /// Negation.
    #[must_use]
    pub fn not(filter: Self) -> Self {
        Self::Not {
            filter: Box::new(filter),
        }
    }

    /// Builds a conjunction of equalities from a JSON object.
    #[must_use]
    pub fn from_fields(fields: &Record) -> Self {
        if fields.is_empty() {
            return Self::All;
        }
        Self::and(
            fields
                .iter()
                .map(|(field, value)| Self::equals(field.clone(), value.clone()))
                .collect(),
        )
    }

    /// Returns true if the record satisfies the filter.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Eq { field, value } => record.get(field).unwrap_or(&Value::Null) == value,
            Self::And { filters } => filters.iter().all(|f| f.matches(record)),
            Self::Or { filters } => filters.iter().any(|f| f.matches(record)),
            Self::Not { filter } => !filter.matches(record),
        }
    }

    /// Splits nested conjunctions into a flat list, dropping `All`.
    #[must_use]
    pub fn into_conjuncts(self) -> Vec<Self> {
        match self {
            Self::All => Vec::new(),
            Self::And { filters } => filters
                .into_iter()
                .flat_map(Self::into_conjuncts)
                .collect(),
            other => vec![other],
        }
    }

    /// Returns true if this is a top-level equality on `field`.
    #[must_use]
    pub fn is_eq_on(&self, field: &str) -> bool {
        matches!(self, Self::Eq { field: f, .. } if f == field)
    }
}

/// Records carried by a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Reads and deletes.
    #[default]
    None,
    /// `create` record or `update` patch.
    One(Record),
    /// `createMany` records.
    Many(Vec<Record>),
}

/// A data-access request against one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Target entity.
    pub entity: Entity,
    /// Operation.
    pub action: Action,
    /// Record selection (ignored by creates).
    #[serde(default)]
    pub filter: Filter,
    /// Write payload.
    #[serde(default)]
    pub data: Payload,
}

impl Query {
    /// Creates a query with no filter and no payload.
    #[must_use]
    pub fn new(entity: Entity, action: Action) -> Self {
        Self {
            entity,
            action,
            filter: Filter::All,
            data: Payload::None,
        }
    }

    /// `findMany`
    #[must_use]
    pub fn find_many(entity: Entity, filter: Filter) -> Self {
        Self::new(entity, Action::FindMany).with_filter(filter)
    }

    /// `findFirst`
    #[must_use]
    pub fn find_first(entity: Entity, filter: Filter) -> Self {
        Self::new(entity, Action::FindFirst).with_filter(filter)
    }

    /// `findUnique` by primary key.
    #[must_use]
    pub fn find_unique(entity: Entity, id: &str) -> Self {
        Self::new(entity, Action::FindUnique).with_filter(Filter::equals(ID_FIELD, id))
    }

    /// `count`
    #[must_use]
    pub fn count(entity: Entity, filter: Filter) -> Self {
        Self::new(entity, Action::Count).with_filter(filter)
    }

    /// `create`
    #[must_use]
    pub fn create(entity: Entity, record: Record) -> Self {
        Self::new(entity, Action::Create).with_data(Payload::One(record))
    }

    /// `createMany`
    #[must_use]
    pub fn create_many(entity: Entity, records: Vec<Record>) -> Self {
        Self::new(entity, Action::CreateMany).with_data(Payload::Many(records))
    }

    /// `update` of the record with the given primary key.
    #[must_use]
    pub fn update(entity: Entity, id: &str, patch: Record) -> Self {
        Self::new(entity, Action::Update)
            .with_filter(Filter::equals(ID_FIELD, id))
            .with_data(Payload::One(patch))
    }

    /// `updateMany`
    #[must_use]
    pub fn update_many(entity: Entity, filter: Filter, patch: Record) -> Self {
        Self::new(entity, Action::UpdateMany)
            .with_filter(filter)
            .with_data(Payload::One(patch))
    }

    /// `delete` of the record with the given primary key.
    #[must_use]
    pub fn delete(entity: Entity, id: &str) -> Self {
        Self::new(entity, Action::Delete).with_filter(Filter::equals(ID_FIELD, id))
    }

    /// `deleteMany`
    #[must_use]
    pub fn delete_many(entity: Entity, filter: Filter) -> Self {
        Self::new(entity, Action::DeleteMany).with_filter(filter)
    }

    /// Replaces the filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Replaces the payload.
    #[must_use]
    pub fn with_data(mut self, data: Payload) -> Self {
        self.data = data;
        self
    }
}
