//! System table DDL. All tables live in the schema from `CAMP_SCHEMA` (default `camp`).

use crate::error::AppError;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Returns schema-qualified table name (e.g. "camp.records").
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", schema, table)
}

/// Create the schema and system tables if missing. Idempotent.
pub async fn ensure_sys_tables(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
        .execute(pool)
        .await?;

    let users = qualified_table(schema, "users");
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id UUID PRIMARY KEY,
            tenant_id TEXT NOT NULL,
            email TEXT NOT NULL,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        users
    ))
    .execute(pool)
    .await?;
    sqlx::query(&format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS users_tenant_email_idx ON {} (tenant_id, lower(email))",
        users
    ))
    .execute(pool)
    .await?;

    let sessions = qualified_table(schema, "sessions");
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            token_hash TEXT PRIMARY KEY,
            user_id UUID NOT NULL REFERENCES {} (id) ON DELETE CASCADE,
            tenant_id TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            expires_at TIMESTAMPTZ NOT NULL
        )
        "#,
        sessions, users
    ))
    .execute(pool)
    .await?;

    let records = qualified_table(schema, "records");
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            tenant_id TEXT NOT NULL,
            router TEXT NOT NULL,
            id UUID NOT NULL,
            created_by UUID,
            payload JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (tenant_id, router, id)
        )
        "#,
        records
    ))
    .execute(pool)
    .await?;
    sqlx::query(&format!(
        "CREATE INDEX IF NOT EXISTS records_payload_idx ON {} USING GIN (payload jsonb_path_ops)",
        records
    ))
    .execute(pool)
    .await?;

    let drafts = qualified_table(schema, "drafts");
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            tenant_id TEXT NOT NULL,
            owner TEXT NOT NULL,
            form TEXT NOT NULL,
            value JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (tenant_id, owner, form)
        )
        "#,
        drafts
    ))
    .execute(pool)
    .await?;

    tracing::info!(schema = %schema, "system tables ready");
    Ok(())
}

/// Connect to the server's `postgres` database and create the target database if it does not exist.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let opts = sqlx::postgres::PgConnectOptions::from_str(database_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let db_name = opts.get_database().unwrap_or("postgres").to_string();
    if db_name == "postgres" {
        return Ok(());
    }
    let admin_opts = opts.clone().database("postgres");
    let mut conn = admin_opts.connect().await?;
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        let quoted = format!("\"{}\"", db_name.replace('"', "\"\""));
        sqlx::query(&format!("CREATE DATABASE {}", quoted))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}
