//! PostgreSQL-backed users and sessions.

use crate::auth::store::{IdentityStore, SessionIdentity, User};
use crate::error::AppError;
use crate::store::qualified_table;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

type UserRow = (Uuid, String, String, String, String, DateTime<Utc>);

pub struct PgIdentityStore {
    pool: PgPool,
    users: String,
    sessions: String,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool, schema: &str) -> Self {
        PgIdentityStore {
            pool,
            users: qualified_table(schema, "users"),
            sessions: qualified_table(schema, "sessions"),
        }
    }
}

fn to_user(row: UserRow) -> User {
    let (id, tenant_id, email, name, password_hash, created_at) = row;
    User {
        id,
        tenant_id,
        email,
        name,
        password_hash,
        created_at,
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO {} (id, tenant_id, email, name, password_hash, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
            self.users
        );
        let result = sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.tenant_id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::Conflict("email already registered".into()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, tenant_id: &str, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!(
            "SELECT id, tenant_id, email, name, password_hash, created_at FROM {} WHERE tenant_id = $1 AND lower(email) = lower($2)",
            self.users
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(to_user))
    }

    async fn create_session(&self, token_hash: &str, user: &User, expires_at: DateTime<Utc>) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO {} (token_hash, user_id, tenant_id, expires_at) VALUES ($1, $2, $3, $4)",
            self.sessions
        );
        sqlx::query(&sql)
            .bind(token_hash)
            .bind(user.id)
            .bind(&user.tenant_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn resolve_session(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<SessionIdentity>, AppError> {
        let sql = format!(
            r#"
            SELECT u.id, s.tenant_id, u.email, u.name, s.expires_at
            FROM {} s JOIN {} u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > $2
            "#,
            self.sessions, self.users
        );
        let row: Option<(Uuid, String, String, String, DateTime<Utc>)> = sqlx::query_as(&sql)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(user_id, tenant_id, email, name, expires_at)| SessionIdentity {
            user_id,
            tenant_id,
            email,
            name,
            expires_at,
        }))
    }

    async fn revoke_session(&self, token_hash: &str) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE token_hash = $1", self.sessions);
        let result = sqlx::query(&sql).bind(token_hash).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let sql = format!("DELETE FROM {} WHERE expires_at <= $1", self.sessions);
        let result = sqlx::query(&sql).bind(now).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
