//! Tenant-scoped record storage in PostgreSQL: one JSONB row per record in `<schema>.records`.

use crate::config::ResolvedRouter;
use crate::error::AppError;
use crate::service::entity::{
    duplicate_key, merge_patch, record_not_found, unique_keys, EntityService, ListQuery, Scope, StoredRecord,
};
use crate::store::qualified_table;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

type RecordRow = (Uuid, Option<Uuid>, Value, DateTime<Utc>, DateTime<Utc>);

const COLUMNS: &str = "id, created_by, payload, created_at, updated_at";

pub struct PgEntityService {
    pool: PgPool,
    table: String,
}

impl PgEntityService {
    pub fn new(pool: PgPool, schema: &str) -> Self {
        PgEntityService {
            pool,
            table: qualified_table(schema, "records"),
        }
    }

    /// Serializes writers per (tenant, router) for the rest of the transaction so unique checks are race-free.
    async fn lock_partition(&self, conn: &mut PgConnection, scope: &Scope, router: &ResolvedRouter) -> Result<(), AppError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("{}:{}", scope.tenant_id, router.id))
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn check_unique(
        &self,
        conn: &mut PgConnection,
        scope: &Scope,
        router: &ResolvedRouter,
        payload: &Map<String, Value>,
        except: Option<Uuid>,
    ) -> Result<(), AppError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE tenant_id = $1 AND router = $2 AND payload @> $3 AND ($4::uuid IS NULL OR id <> $4))",
            self.table
        );
        for (group, wanted) in unique_keys(router, payload) {
            tracing::debug!(sql = %sql, router = %router.id, ?group, "unique check");
            let taken: bool = sqlx::query_scalar(&sql)
                .bind(&scope.tenant_id)
                .bind(&router.id)
                .bind(Value::Object(wanted))
                .bind(except)
                .fetch_one(&mut *conn)
                .await?;
            if taken {
                return Err(duplicate_key(router, group));
            }
        }
        Ok(())
    }

    /// Unique check plus insert; the caller holds the partition lock.
    async fn insert(
        &self,
        conn: &mut PgConnection,
        scope: &Scope,
        router: &ResolvedRouter,
        input: Map<String, Value>,
    ) -> Result<Value, AppError> {
        self.check_unique(conn, scope, router, &input, None).await?;
        let sql = format!(
            "INSERT INTO {} (tenant_id, router, id, created_by, payload) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            self.table, COLUMNS
        );
        tracing::debug!(sql = %sql, router = %router.id, "query");
        let row: RecordRow = sqlx::query_as(&sql)
            .bind(&scope.tenant_id)
            .bind(&router.id)
            .bind(Uuid::new_v4())
            .bind(scope.user_id)
            .bind(Value::Object(input))
            .fetch_one(&mut *conn)
            .await?;
        Ok(to_record(row)?.to_value())
    }
}

fn to_record(row: RecordRow) -> Result<StoredRecord, AppError> {
    let (id, created_by, payload, created_at, updated_at) = row;
    let payload = match payload {
        Value::Object(map) => map,
        _ => return Err(AppError::Internal(format!("record {} has a non-object payload", id))),
    };
    Ok(StoredRecord {
        id,
        created_by,
        payload,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl EntityService for PgEntityService {
    async fn create(&self, scope: &Scope, router: &ResolvedRouter, input: Map<String, Value>) -> Result<Value, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_partition(&mut tx, scope, router).await?;
        let value = self.insert(&mut tx, scope, router, input).await?;
        tx.commit().await?;
        Ok(value)
    }

    async fn create_unless(
        &self,
        scope: &Scope,
        router: &ResolvedRouter,
        existing: &Map<String, Value>,
        input: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_partition(&mut tx, scope, router).await?;
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE tenant_id = $1 AND router = $2 AND payload @> $3)",
            self.table
        );
        tracing::debug!(sql = %sql, router = %router.id, "query");
        let found: bool = sqlx::query_scalar(&sql)
            .bind(&scope.tenant_id)
            .bind(&router.id)
            .bind(Value::Object(existing.clone()))
            .fetch_one(&mut *tx)
            .await?;
        if found {
            return Ok(None);
        }
        let value = self.insert(&mut tx, scope, router, input).await?;
        tx.commit().await?;
        Ok(Some(value))
    }

    async fn list(&self, scope: &Scope, router: &ResolvedRouter, query: &ListQuery) -> Result<Vec<Value>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE tenant_id = $1 AND router = $2 AND payload @> $3 ORDER BY created_at DESC, id LIMIT $4 OFFSET $5",
            COLUMNS, self.table
        );
        tracing::debug!(sql = %sql, router = %router.id, filters = ?query.filters, "query");
        let rows: Vec<RecordRow> = sqlx::query_as(&sql)
            .bind(&scope.tenant_id)
            .bind(&router.id)
            .bind(Value::Object(query.filters.clone()))
            .bind(i64::from(query.limit))
            .bind(i64::from(query.offset))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(|r| to_record(r).map(|r| r.to_value())).collect()
    }

    async fn get(&self, scope: &Scope, router: &ResolvedRouter, id: Uuid) -> Result<Value, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE tenant_id = $1 AND router = $2 AND id = $3",
            COLUMNS, self.table
        );
        tracing::debug!(sql = %sql, router = %router.id, %id, "query");
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(&scope.tenant_id)
            .bind(&router.id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let row = row.ok_or_else(|| record_not_found(router, id))?;
        Ok(to_record(row)?.to_value())
    }

    async fn update(
        &self,
        scope: &Scope,
        router: &ResolvedRouter,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let mut tx = self.pool.begin().await?;
        self.lock_partition(&mut tx, scope, router).await?;
        let select = format!(
            "SELECT {} FROM {} WHERE tenant_id = $1 AND router = $2 AND id = $3 FOR UPDATE",
            COLUMNS, self.table
        );
        let current: Option<RecordRow> = sqlx::query_as(&select)
            .bind(&scope.tenant_id)
            .bind(&router.id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let mut record = to_record(current.ok_or_else(|| record_not_found(router, id))?)?;
        merge_patch(&mut record.payload, patch);
        self.check_unique(&mut tx, scope, router, &record.payload, Some(id)).await?;

        let sql = format!(
            "UPDATE {} SET payload = $4, updated_at = NOW() WHERE tenant_id = $1 AND router = $2 AND id = $3 RETURNING {}",
            self.table, COLUMNS
        );
        tracing::debug!(sql = %sql, router = %router.id, %id, "query");
        let row: RecordRow = sqlx::query_as(&sql)
            .bind(&scope.tenant_id)
            .bind(&router.id)
            .bind(id)
            .bind(Value::Object(record.payload))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(to_record(row)?.to_value())
    }

    async fn delete(&self, scope: &Scope, router: &ResolvedRouter, id: Uuid) -> Result<Value, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE tenant_id = $1 AND router = $2 AND id = $3 RETURNING {}",
            self.table, COLUMNS
        );
        tracing::debug!(sql = %sql, router = %router.id, %id, "query");
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(&scope.tenant_id)
            .bind(&router.id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let row = row.ok_or_else(|| record_not_found(router, id))?;
        Ok(to_record(row)?.to_value())
    }
}
