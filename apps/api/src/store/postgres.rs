use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{Collection, Direction, Filter, Predicate, RecordStore, SelectQuery, StoreError};

const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed record store. Rows are returned as `to_jsonb(row)`.
///
/// Field names are never taken from callers verbatim: every predicate,
/// order and insert column is checked against the collection whitelist
/// before it reaches SQL. Values are always bound.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_db_error(collection: Collection, e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::UniqueViolation(collection.table())
        }
        _ => StoreError::Database(e),
    }
}

fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, filter: &Filter) {
    for (i, predicate) in filter.predicates().iter().enumerate() {
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::Eq { field, value } => {
                qb.push(format!("{alias}.{field}::text = "));
                qb.push_bind(value.clone());
            }
            Predicate::Contains { field, needle } => {
                qb.push(format!("{alias}.{field}::text ILIKE "));
                qb.push_bind(format!("%{}%", escape_like(needle)));
            }
            Predicate::In { field, values } => {
                qb.push(format!("{alias}.{field}::text = ANY("));
                qb.push_bind(values.clone());
                qb.push(")");
            }
        }
    }
}

fn direction_sql(direction: Direction) -> &'static str {
    match direction {
        // Rows without a timestamp sort as earliest in both directions,
        // matching the view layer.
        Direction::Ascending => "ASC NULLS FIRST",
        Direction::Descending => "DESC NULLS LAST",
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn select(
        &self,
        collection: Collection,
        query: &SelectQuery,
    ) -> Result<Vec<Value>, StoreError> {
        query.check(collection)?;
        let table = collection.table();

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT ");
        if query.with_job && collection == Collection::Applications {
            qb.push(
                "to_jsonb(r) || jsonb_build_object('job', (\
                 SELECT jsonb_build_object('title', j.title, 'company', j.company, 'location', j.location) \
                 FROM jobs j WHERE j.id = r.job_id))",
            );
        } else {
            qb.push("to_jsonb(r)");
        }
        qb.push(format!(" FROM {table} r"));
        push_filter(&mut qb, "r", &query.filter);
        if let Some(order) = &query.order_by {
            qb.push(format!(
                " ORDER BY r.{} {}",
                order.field,
                direction_sql(order.direction)
            ));
        }
        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit as i64);
        }

        debug!("select from {table}: {}", qb.sql());
        qb.build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error(collection, e))
    }

    async fn insert(&self, collection: Collection, record: Value) -> Result<Value, StoreError> {
        let table = collection.table();
        let object = record
            .as_object()
            .ok_or_else(|| StoreError::InvalidRecord(format!("{table} record must be an object")))?;
        if object.is_empty() {
            return Err(StoreError::InvalidRecord(format!("empty {table} record")));
        }
        for key in object.keys() {
            collection.check_field(key)?;
        }
        let columns = object.keys().cloned().collect::<Vec<_>>().join(", ");

        // Only the supplied columns are copied, so omitted ones keep their
        // column defaults (id sequence, created_at).
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, "
        ));
        qb.push_bind(sqlx::types::Json(record));
        qb.push(format!(") RETURNING to_jsonb({table}.*)"));

        qb.build_query_scalar::<Value>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(collection, e))
    }

    async fn delete(&self, collection: Collection, filter: &Filter) -> Result<u64, StoreError> {
        let table = collection.table();
        if filter.is_empty() {
            return Err(StoreError::UnscopedDelete(table));
        }
        filter.check(collection)?;

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!("DELETE FROM {table} r"));
        push_filter(&mut qb, "r", filter);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_db_error(collection, e))?;
        Ok(result.rows_affected())
    }
}
