//! Domain service seam for catalog routers: every call is scoped to one tenant.

use crate::config::ResolvedRouter;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const DEFAULT_LIST_LIMIT: u32 = 100;
pub const MAX_LIST_LIMIT: u32 = 1000;

/// Caller scope taken from the session (or from the tenant header for public submissions).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scope {
    pub tenant_id: String,
    /// None for anonymous public submissions.
    pub user_id: Option<Uuid>,
}

impl Scope {
    pub fn user(tenant_id: impl Into<String>, user_id: Uuid) -> Self {
        Scope {
            tenant_id: tenant_id.into(),
            user_id: Some(user_id),
        }
    }

    pub fn anonymous(tenant_id: impl Into<String>) -> Self {
        Scope {
            tenant_id: tenant_id.into(),
            user_id: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListQuery {
    /// Exact-match filters on filterable fields.
    pub filters: Map<String, Value>,
    pub limit: u32,
    pub offset: u32,
}

impl ListQuery {
    pub fn new(filters: Map<String, Value>, limit: Option<u32>, offset: Option<u32>) -> Self {
        ListQuery {
            filters,
            limit: limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT),
            offset: offset.unwrap_or(0),
        }
    }
}

#[async_trait]
pub trait EntityService: Send + Sync {
    async fn create(&self, scope: &Scope, router: &ResolvedRouter, input: Map<String, Value>) -> Result<Value, AppError>;

    /// Like `create`, but returns None when a record containing `existing` is already stored.
    /// The check and the insert are atomic per (tenant, router).
    async fn create_unless(
        &self,
        scope: &Scope,
        router: &ResolvedRouter,
        existing: &Map<String, Value>,
        input: Map<String, Value>,
    ) -> Result<Option<Value>, AppError>;

    /// Newest first.
    async fn list(&self, scope: &Scope, router: &ResolvedRouter, query: &ListQuery) -> Result<Vec<Value>, AppError>;

    async fn get(&self, scope: &Scope, router: &ResolvedRouter, id: Uuid) -> Result<Value, AppError>;

    /// Merge `patch` into the stored fields; null removes a field.
    async fn update(
        &self,
        scope: &Scope,
        router: &ResolvedRouter,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Value, AppError>;

    /// Returns the deleted record.
    async fn delete(&self, scope: &Scope, router: &ResolvedRouter, id: Uuid) -> Result<Value, AppError>;
}

/// A stored row: server-managed columns plus the validated payload.
#[derive(Clone, Debug)]
pub struct StoredRecord {
    pub id: Uuid,
    pub created_by: Option<Uuid>,
    pub payload: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    /// Flattened record with snake_case keys; the RPC layer converts them to camelCase.
    pub fn to_value(&self) -> Value {
        let mut map = self.payload.clone();
        map.insert("id".into(), Value::String(self.id.to_string()));
        map.insert(
            "created_by".into(),
            self.created_by.map(|u| Value::String(u.to_string())).unwrap_or(Value::Null),
        );
        map.insert("created_at".into(), Value::String(self.created_at.to_rfc3339()));
        map.insert("updated_at".into(), Value::String(self.updated_at.to_rfc3339()));
        Value::Object(map)
    }
}

pub fn merge_patch(payload: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (k, v) in patch {
        if v.is_null() {
            payload.remove(&k);
        } else {
            payload.insert(k, v);
        }
    }
}

/// For each unique group fully present in `payload`, the sub-object that must not already exist.
/// Groups with a missing or null member are skipped.
pub fn unique_keys<'a>(router: &'a ResolvedRouter, payload: &Map<String, Value>) -> Vec<(&'a [String], Map<String, Value>)> {
    router
        .unique
        .iter()
        .filter_map(|group| {
            let mut wanted = Map::new();
            for name in group {
                match payload.get(name) {
                    Some(v) if !v.is_null() => {
                        wanted.insert(name.clone(), v.clone());
                    }
                    _ => return None,
                }
            }
            Some((group.as_slice(), wanted))
        })
        .collect()
}

pub fn duplicate_key(router: &ResolvedRouter, group: &[String]) -> AppError {
    AppError::Conflict(format!("duplicate key: {} with this {} already exists", router.id, group.join(", ")))
}

pub fn record_not_found(router: &ResolvedRouter, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {}", router.label, id))
}
