//! In-memory entity storage for development without a database, and for tests.

use crate::config::ResolvedRouter;
use crate::error::AppError;
use crate::service::entity::{
    duplicate_key, merge_patch, record_not_found, unique_keys, EntityService, ListQuery, Scope, StoredRecord,
};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

type Partition = (String, String);

#[derive(Default)]
pub struct MemoryEntityService {
    /// (tenant, router) -> records in insertion order.
    partitions: RwLock<HashMap<Partition, Vec<StoredRecord>>>,
}

impl MemoryEntityService {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<Partition, Vec<StoredRecord>>>, AppError> {
        self.partitions
            .write()
            .map_err(|_| AppError::Internal("entity store lock poisoned".into()))
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<Partition, Vec<StoredRecord>>>, AppError> {
        self.partitions
            .read()
            .map_err(|_| AppError::Internal("entity store lock poisoned".into()))
    }
}

fn partition(scope: &Scope, router: &ResolvedRouter) -> Partition {
    (scope.tenant_id.clone(), router.id.clone())
}

fn matches(payload: &Map<String, Value>, filters: &Map<String, Value>) -> bool {
    filters.iter().all(|(k, v)| payload.get(k) == Some(v))
}

fn check_unique(
    router: &ResolvedRouter,
    records: &[StoredRecord],
    payload: &Map<String, Value>,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    for (group, wanted) in unique_keys(router, payload) {
        let taken = records
            .iter()
            .filter(|r| Some(r.id) != except)
            .any(|r| matches(&r.payload, &wanted));
        if taken {
            return Err(duplicate_key(router, group));
        }
    }
    Ok(())
}

fn insert(
    router: &ResolvedRouter,
    records: &mut Vec<StoredRecord>,
    scope: &Scope,
    input: Map<String, Value>,
) -> Result<Value, AppError> {
    check_unique(router, records, &input, None)?;
    let now = Utc::now();
    let record = StoredRecord {
        id: Uuid::new_v4(),
        created_by: scope.user_id,
        payload: input,
        created_at: now,
        updated_at: now,
    };
    let value = record.to_value();
    records.push(record);
    Ok(value)
}

#[async_trait]
impl EntityService for MemoryEntityService {
    async fn create(&self, scope: &Scope, router: &ResolvedRouter, input: Map<String, Value>) -> Result<Value, AppError> {
        let mut partitions = self.write()?;
        let records = partitions.entry(partition(scope, router)).or_default();
        insert(router, records, scope, input)
    }

    async fn create_unless(
        &self,
        scope: &Scope,
        router: &ResolvedRouter,
        existing: &Map<String, Value>,
        input: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let mut partitions = self.write()?;
        let records = partitions.entry(partition(scope, router)).or_default();
        if records.iter().any(|r| matches(&r.payload, existing)) {
            return Ok(None);
        }
        insert(router, records, scope, input).map(Some)
    }

    async fn list(&self, scope: &Scope, router: &ResolvedRouter, query: &ListQuery) -> Result<Vec<Value>, AppError> {
        let partitions = self.read()?;
        let Some(records) = partitions.get(&partition(scope, router)) else {
            return Ok(Vec::new());
        };
        Ok(records
            .iter()
            .rev()
            .filter(|r| matches(&r.payload, &query.filters))
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .map(StoredRecord::to_value)
            .collect())
    }

    async fn get(&self, scope: &Scope, router: &ResolvedRouter, id: Uuid) -> Result<Value, AppError> {
        let partitions = self.read()?;
        partitions
            .get(&partition(scope, router))
            .and_then(|records| records.iter().find(|r| r.id == id))
            .map(StoredRecord::to_value)
            .ok_or_else(|| record_not_found(router, id))
    }

    async fn update(
        &self,
        scope: &Scope,
        router: &ResolvedRouter,
        id: Uuid,
        patch: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let mut partitions = self.write()?;
        let records = partitions
            .get_mut(&partition(scope, router))
            .ok_or_else(|| record_not_found(router, id))?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| record_not_found(router, id))?;
        let mut payload = records[index].payload.clone();
        merge_patch(&mut payload, patch);
        check_unique(router, records, &payload, Some(id))?;
        let record = &mut records[index];
        record.payload = payload;
        record.updated_at = Utc::now();
        Ok(record.to_value())
    }

    async fn delete(&self, scope: &Scope, router: &ResolvedRouter, id: Uuid) -> Result<Value, AppError> {
        let mut partitions = self.write()?;
        let records = partitions
            .get_mut(&partition(scope, router))
            .ok_or_else(|| record_not_found(router, id))?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| record_not_found(router, id))?;
        Ok(records.remove(index).to_value())
    }
}
