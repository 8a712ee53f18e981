// Record store: the abstract CRUD surface over the `jobs` and
// `applications` collections.
//
// Rows travel as JSON objects so filters and ordering can stay generic;
// callers decode them into `models` types with `select_as` and friends.
// `AppState` carries an `Arc<dyn RecordStore>`; production uses
// `postgres::PgRecordStore`.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Jobs,
    Applications,
}

const JOB_FIELDS: &[&str] = &[
    "id",
    "title",
    "company",
    "location",
    "type",
    "description",
    "created_at",
    "status",
];

const APPLICATION_FIELDS: &[&str] = &[
    "id",
    "job_id",
    "name",
    "email",
    "resume_url",
    "intro",
    "created_at",
];

impl Collection {
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::Applications => "applications",
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Jobs => JOB_FIELDS,
            Collection::Applications => APPLICATION_FIELDS,
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().contains(&field)
    }

    fn check_field(&self, field: &str) -> Result<(), StoreError> {
        if self.has_field(field) {
            Ok(())
        } else {
            Err(StoreError::UnknownField {
                collection: self.table(),
                field: field.to_string(),
            })
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unique constraint violated on {0}")]
    UniqueViolation(&'static str),

    #[error("Unknown field '{field}' on {collection}")]
    UnknownField {
        collection: &'static str,
        field: String,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Refusing to delete from {0} without a filter")]
    UnscopedDelete(&'static str),

    #[error("Record decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[allow(dead_code)]
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A single predicate over a named field. Values compare by string form.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { field: String, value: String },
    /// Case-insensitive substring match.
    #[allow(dead_code)]
    Contains { field: String, needle: String },
    In { field: String, values: Vec<String> },
}

impl Predicate {
    pub fn field(&self) -> &str {
        match self {
            Predicate::Eq { field, .. }
            | Predicate::Contains { field, .. }
            | Predicate::In { field, .. } => field,
        }
    }
}

/// Conjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl ToString) -> Self {
        self.predicates.push(Predicate::Eq {
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    #[allow(dead_code)]
    pub fn contains(mut self, field: &str, needle: impl ToString) -> Self {
        self.predicates.push(Predicate::Contains {
            field: field.to_string(),
            needle: needle.to_string(),
        });
        self
    }

    pub fn is_in<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.predicates.push(Predicate::In {
            field: field.to_string(),
            values: values.into_iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub(crate) fn check(&self, collection: Collection) -> Result<(), StoreError> {
        self.predicates
            .iter()
            .try_for_each(|p| collection.check_field(p.field()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    #[allow(dead_code)]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

impl OrderBy {
    #[allow(dead_code)]
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: Direction::Descending,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub filter: Filter,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    /// Attach `job: {title, company, location}` to each application row.
    pub with_job: bool,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_job(mut self) -> Self {
        self.with_job = true;
        self
    }

    pub(crate) fn check(&self, collection: Collection) -> Result<(), StoreError> {
        self.filter.check(collection)?;
        if let Some(order) = &self.order_by {
            collection.check_field(&order.field)?;
        }
        Ok(())
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select(
        &self,
        collection: Collection,
        query: &SelectQuery,
    ) -> Result<Vec<Value>, StoreError>;

    async fn select_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Value>, StoreError> {
        let query = SelectQuery::new().filter(filter.clone()).limit(1);
        Ok(self.select(collection, &query).await?.into_iter().next())
    }

    /// Inserts a JSON object and returns the stored row (with generated id
    /// and timestamp).
    async fn insert(&self, collection: Collection, record: Value) -> Result<Value, StoreError>;

    /// Deletes every row matching `filter`; returns the number removed.
    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError>;
}

/// Selects and decodes rows. Rows that fail to decode are skipped with a
/// warning rather than failing the whole read.
pub async fn select_as<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
    query: &SelectQuery,
) -> Result<Vec<T>, StoreError> {
    let rows = store.select(collection, query).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping malformed {} row: {e}", collection.table());
                None
            }
        })
        .collect())
}

pub async fn select_one_as<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
    filter: &Filter,
) -> Result<Option<T>, StoreError> {
    match store.select_one(collection, filter).await? {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

/// Read path for views: a failed read degrades to an empty list.
pub async fn select_or_empty<T: DeserializeOwned>(
    store: &dyn RecordStore,
    collection: Collection,
    query: &SelectQuery,
) -> Vec<T> {
    select_as(store, collection, query)
        .await
        .unwrap_or_else(|e| {
            warn!("Error loading {}: {e}", collection.table());
            Vec::new()
        })
}

/// String form of a JSON scalar, matching how ids and filters compare.
#[cfg(test)]
pub(crate) fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryRecordStore;
    use serde_json::json;

    #[test]
    fn test_unknown_field_is_rejected() {
        let query = SelectQuery::new().filter(Filter::new().eq("salary", 10));
        let err = query.check(Collection::Jobs).unwrap_err();
        assert!(matches!(err, StoreError::UnknownField { .. }));
    }

    #[test]
    fn test_order_field_is_checked() {
        let query = SelectQuery::new().order_by(OrderBy::desc("job_id"));
        assert!(query.check(Collection::Applications).is_ok());
        assert!(query.check(Collection::Jobs).is_err());
    }

    #[tokio::test]
    async fn test_select_as_skips_rows_that_are_not_objects() {
        let store = MemoryRecordStore::with_records(
            vec![json!({"id": 1, "title": "A"}), json!("garbage")],
            vec![],
        );
        let jobs: Vec<crate::models::Job> = select_as(&store, Collection::Jobs, &SelectQuery::new())
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_select_or_empty_degrades_on_failure() {
        let store = MemoryRecordStore::new();
        store.set_fail_reads(true);
        let jobs: Vec<crate::models::Job> =
            select_or_empty(&store, Collection::Jobs, &SelectQuery::new()).await;
        assert!(jobs.is_empty());
    }
}
