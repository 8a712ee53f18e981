use std::cmp::Ordering;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};

use super::{
    value_as_text, Collection, Direction, Filter, Predicate, RecordStore, SelectQuery, StoreError,
};

/// In-memory record store used by tests. Mirrors the Postgres schema:
/// generated numeric ids, default `created_at`, and a unique
/// `(job_id, email)` constraint on applications.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

#[derive(Default)]
struct Inner {
    jobs: Vec<Value>,
    applications: Vec<Value>,
    next_id: i64,
}

impl Inner {
    fn rows(&self, collection: Collection) -> &Vec<Value> {
        match collection {
            Collection::Jobs => &self.jobs,
            Collection::Applications => &self.applications,
        }
    }

    fn rows_mut(&mut self, collection: Collection) -> &mut Vec<Value> {
        match collection {
            Collection::Jobs => &mut self.jobs,
            Collection::Applications => &mut self.applications,
        }
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(jobs: Vec<Value>, applications: Vec<Value>) -> Self {
        let next_id = jobs
            .iter()
            .chain(applications.iter())
            .filter_map(|r| r.get("id").and_then(Value::as_i64))
            .max()
            .unwrap_or(0);
        Self {
            inner: Mutex::new(Inner {
                jobs,
                applications,
                next_id,
            }),
            ..Self::default()
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.inner.lock().unwrap().rows(collection).len()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("simulated read failure".into()));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }
        Ok(())
    }
}

fn field_text(row: &Value, field: &str) -> Option<String> {
    row.get(field).and_then(value_as_text)
}

fn matches(row: &Value, filter: &Filter) -> bool {
    filter.predicates().iter().all(|p| match p {
        Predicate::Eq { field, value } => field_text(row, field).as_deref() == Some(value.as_str()),
        Predicate::Contains { field, needle } => field_text(row, field)
            .map(|v| v.to_lowercase().contains(&needle.to_lowercase()))
            .unwrap_or(false),
        Predicate::In { field, values } => field_text(row, field)
            .map(|v| values.contains(&v))
            .unwrap_or(false),
    })
}

fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        _ => field_text(a, field).cmp(&field_text(b, field)),
    }
}

fn join_job(jobs: &[Value], application: &mut Value) {
    let job_id = field_text(application, "job_id");
    let summary = jobs
        .iter()
        .find(|j| job_id.is_some() && field_text(j, "id") == job_id)
        .map(|j| {
            let mut m = Map::new();
            for key in ["title", "company", "location"] {
                m.insert(key.to_string(), j.get(key).cloned().unwrap_or(Value::Null));
            }
            Value::Object(m)
        })
        .unwrap_or(Value::Null);
    if let Some(obj) = application.as_object_mut() {
        obj.insert("job".to_string(), summary);
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn select(
        &self,
        collection: Collection,
        query: &SelectQuery,
    ) -> Result<Vec<Value>, StoreError> {
        self.check_reads()?;
        query.check(collection)?;
        let inner = self.inner.lock().unwrap();

        let mut rows: Vec<Value> = inner
            .rows(collection)
            .iter()
            .filter(|row| matches(row, &query.filter))
            .cloned()
            .collect();

        if let Some(order) = &query.order_by {
            rows.sort_by(|a, b| {
                let ord = compare_field(a, b, &order.field);
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        if query.with_job && collection == Collection::Applications {
            for row in rows.iter_mut() {
                join_job(&inner.jobs, row);
            }
        }
        Ok(rows)
    }

    async fn insert(&self, collection: Collection, record: Value) -> Result<Value, StoreError> {
        self.check_writes()?;
        let Value::Object(mut object) = record else {
            return Err(StoreError::InvalidRecord("record must be an object".into()));
        };
        for key in object.keys() {
            if !collection.has_field(key) {
                return Err(StoreError::UnknownField {
                    collection: collection.table(),
                    field: key.clone(),
                });
            }
        }

        let mut inner = self.inner.lock().unwrap();
        if collection == Collection::Applications {
            let candidate = Value::Object(object.clone());
            let duplicate = inner.applications.iter().any(|row| {
                field_text(row, "job_id") == field_text(&candidate, "job_id")
                    && field_text(row, "email") == field_text(&candidate, "email")
            });
            if duplicate {
                return Err(StoreError::UniqueViolation(collection.table()));
            }
        }

        inner.next_id += 1;
        let id = inner.next_id;
        object.entry("id").or_insert_with(|| Value::from(id));
        object
            .entry("created_at")
            .or_insert_with(|| Value::from(Utc::now().to_rfc3339()));
        let row = Value::Object(object);
        inner.rows_mut(collection).push(row.clone());
        Ok(row)
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        self.check_writes()?;
        if filter.is_empty() {
            return Err(StoreError::UnscopedDelete(collection.table()));
        }
        filter.check(collection)?;
        let mut inner = self.inner.lock().unwrap();
        let rows = inner.rows_mut(collection);
        let before = rows.len();
        rows.retain(|row| !matches(row, filter));
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OrderBy;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamp() {
        let store = MemoryRecordStore::new();
        let row = store
            .insert(Collection::Jobs, json!({"title": "Rust Dev"}))
            .await
            .unwrap();
        assert_eq!(row["id"], json!(1));
        assert!(row["created_at"].is_string());
    }

    #[tokio::test]
    async fn test_unique_application_per_job_and_email() {
        let store = MemoryRecordStore::new();
        let app = json!({"job_id": "1", "email": "a@b.co", "name": "A"});
        store.insert(Collection::Applications, app.clone()).await.unwrap();
        let err = store.insert(Collection::Applications, app).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation("applications")));
    }

    #[tokio::test]
    async fn test_filters_and_order() {
        let store = MemoryRecordStore::with_records(
            vec![
                json!({"id": 1, "title": "Rust Engineer", "location": "Berlin", "created_at": "2024-01-01T00:00:00Z"}),
                json!({"id": 2, "title": "Go Engineer", "location": "Remote", "created_at": "2024-02-01T00:00:00Z"}),
                json!({"id": 3, "title": "rust intern", "location": "Remote", "created_at": "2024-03-01T00:00:00Z"}),
            ],
            vec![],
        );
        let query = SelectQuery::new()
            .filter(Filter::new().contains("title", "RUST"))
            .order_by(OrderBy::desc("created_at"));
        let rows = store.select(Collection::Jobs, &query).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(1)]);

        let query = SelectQuery::new().filter(Filter::new().is_in("id", ["2", "3"]));
        assert_eq!(store.select(Collection::Jobs, &query).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_join_attaches_job_summary() {
        let store = MemoryRecordStore::with_records(
            vec![json!({"id": 5, "title": "SRE", "company": "Acme", "location": "Oslo"})],
            vec![json!({"id": 6, "job_id": 5, "email": "x@y.z"})],
        );
        let rows = store
            .select(Collection::Applications, &SelectQuery::new().with_job())
            .await
            .unwrap();
        assert_eq!(rows[0]["job"]["company"], json!("Acme"));
    }

    #[tokio::test]
    async fn test_delete_requires_filter() {
        let store = MemoryRecordStore::new();
        let err = store.delete(Collection::Jobs, &Filter::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::UnscopedDelete("jobs")));
    }
}
