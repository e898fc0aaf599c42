//! Users and sessions: the `IdentityStore` seam and its in-memory implementation.

use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: String,
    /// Stored lowercase.
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Identity attached to a live session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub tenant_id: String,
    pub email: String,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Conflict when the email is already registered in the tenant.
    async fn create_user(&self, user: User) -> Result<User, AppError>;

    async fn find_user(&self, tenant_id: &str, email: &str) -> Result<Option<User>, AppError>;

    async fn create_session(&self, token_hash: &str, user: &User, expires_at: DateTime<Utc>) -> Result<(), AppError>;

    /// None when the session is unknown, revoked, or expired at `now`.
    async fn resolve_session(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<SessionIdentity>, AppError>;

    /// Returns whether a session was removed.
    async fn revoke_session(&self, token_hash: &str) -> Result<bool, AppError>;

    /// Deletes sessions expired at `now`; returns how many were removed.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError>;
}

#[derive(Default)]
pub struct MemoryIdentityStore {
    users: RwLock<HashMap<Uuid, User>>,
    sessions: RwLock<HashMap<String, (Uuid, DateTime<Utc>)>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> AppError {
    AppError::Internal("identity store lock poisoned".into())
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        let taken = users
            .values()
            .any(|u| u.tenant_id == user.tenant_id && u.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(AppError::Conflict("email already registered".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, tenant_id: &str, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users
            .values()
            .find(|u| u.tenant_id == tenant_id && u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_session(&self, token_hash: &str, user: &User, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        sessions.insert(token_hash.to_string(), (user.id, expires_at));
        Ok(())
    }

    async fn resolve_session(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<SessionIdentity>, AppError> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        let Some((user_id, expires_at)) = sessions.get(token_hash).copied() else {
            return Ok(None);
        };
        if expires_at <= now {
            return Ok(None);
        }
        let users = self.users.read().map_err(|_| poisoned())?;
        Ok(users.get(&user_id).map(|u| SessionIdentity {
            user_id: u.id,
            tenant_id: u.tenant_id.clone(),
            email: u.email.clone(),
            name: u.name.clone(),
            expires_at,
        }))
    }

    async fn revoke_session(&self, token_hash: &str) -> Result<bool, AppError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        Ok(sessions.remove(token_hash).is_some())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        let before = sessions.len();
        sessions.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - sessions.len()) as u64)
    }
}
