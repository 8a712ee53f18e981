use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS jobs (
        id BIGSERIAL PRIMARY KEY,
        title TEXT,
        company TEXT,
        location TEXT,
        type TEXT,
        description TEXT,
        status TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS applications (
        id BIGSERIAL PRIMARY KEY,
        job_id BIGINT,
        name TEXT,
        email TEXT,
        resume_url TEXT,
        intro TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    // One application per (job, email). Backs the read-then-insert check.
    "CREATE UNIQUE INDEX IF NOT EXISTS applications_job_email_key
        ON applications (job_id, email)",
    "CREATE INDEX IF NOT EXISTS applications_job_id_idx ON applications (job_id)",
];

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the `jobs` and `applications` tables and their indexes if missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Schema statement failed: {statement}"))?;
    }
    info!("Database schema ready");
    Ok(())
}
