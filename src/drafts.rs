//! Key-value draft storage so a partially filled form can be resumed.

use crate::error::AppError;
use crate::store::qualified_table;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DraftKey {
    pub tenant_id: String,
    /// User id, or a client-generated id for anonymous visitors.
    pub owner: String,
    /// Form name, e.g. `donation`.
    pub form: String,
}

impl DraftKey {
    pub fn new(tenant_id: impl Into<String>, owner: impl Into<String>, form: impl Into<String>) -> Self {
        DraftKey {
            tenant_id: tenant_id.into(),
            owner: owner.into(),
            form: form.into(),
        }
    }
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Upsert.
    async fn save(&self, key: &DraftKey, value: &Value) -> Result<(), AppError>;

    async fn restore(&self, key: &DraftKey) -> Result<Option<Value>, AppError>;

    /// Returns whether a draft existed.
    async fn clear(&self, key: &DraftKey) -> Result<bool, AppError>;
}

#[derive(Default)]
pub struct MemoryDraftStore {
    drafts: RwLock<HashMap<DraftKey, Value>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AppError {
    AppError::Internal("draft store lock poisoned".into())
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn save(&self, key: &DraftKey, value: &Value) -> Result<(), AppError> {
        self.drafts.write().map_err(|_| poisoned())?.insert(key.clone(), value.clone());
        Ok(())
    }

    async fn restore(&self, key: &DraftKey) -> Result<Option<Value>, AppError> {
        Ok(self.drafts.read().map_err(|_| poisoned())?.get(key).cloned())
    }

    async fn clear(&self, key: &DraftKey) -> Result<bool, AppError> {
        Ok(self.drafts.write().map_err(|_| poisoned())?.remove(key).is_some())
    }
}

pub struct PgDraftStore {
    pool: PgPool,
    table: String,
}

impl PgDraftStore {
    pub fn new(pool: PgPool, schema: &str) -> Self {
        PgDraftStore {
            pool,
            table: qualified_table(schema, "drafts"),
        }
    }
}

#[async_trait]
impl DraftStore for PgDraftStore {
    async fn save(&self, key: &DraftKey, value: &Value) -> Result<(), AppError> {
        let sql = format!(
            r#"
            INSERT INTO {} (tenant_id, owner, form, value, updated_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (tenant_id, owner, form)
            DO UPDATE SET value = $4, updated_at = NOW()
            "#,
            self.table
        );
        sqlx::query(&sql)
            .bind(&key.tenant_id)
            .bind(&key.owner)
            .bind(&key.form)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn restore(&self, key: &DraftKey) -> Result<Option<Value>, AppError> {
        let sql = format!(
            "SELECT value FROM {} WHERE tenant_id = $1 AND owner = $2 AND form = $3",
            self.table
        );
        let row: Option<(Value,)> = sqlx::query_as(&sql)
            .bind(&key.tenant_id)
            .bind(&key.owner)
            .bind(&key.form)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    async fn clear(&self, key: &DraftKey) -> Result<bool, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE tenant_id = $1 AND owner = $2 AND form = $3",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(&key.tenant_id)
            .bind(&key.owner)
            .bind(&key.form)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_restore_clear() {
        let store = MemoryDraftStore::new();
        let key = DraftKey::new("alpha", "user-1", "donation");
        assert!(store.restore(&key).await.unwrap().is_none());

        store.save(&key, &json!({ "amount": 7500 })).await.unwrap();
        store.save(&key, &json!({ "amount": 2500 })).await.unwrap();
        assert_eq!(store.restore(&key).await.unwrap(), Some(json!({ "amount": 2500 })));

        let other_tenant = DraftKey::new("beta", "user-1", "donation");
        assert!(store.restore(&other_tenant).await.unwrap().is_none());

        assert!(store.clear(&key).await.unwrap());
        assert!(!store.clear(&key).await.unwrap());
    }
}
