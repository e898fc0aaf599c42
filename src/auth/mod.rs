//! Registration, login and logout over an `IdentityStore`.

mod password;
mod postgres;
mod store;

pub use password::{generate_token, hash_password, token_digest, verify_password, MIN_PASSWORD_LEN};
pub use postgres::PgIdentityStore;
pub use store::{IdentityStore, MemoryIdentityStore, SessionIdentity, User};

use crate::error::{AppError, FieldErrors};
use crate::service::is_valid_email;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: Uuid,
    pub tenant_id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    /// Shown once; send back as `Authorization: Bearer <token>`.
    pub token: String,
    pub session: SessionIdentity,
}

/// Argon2 is CPU bound; it runs on the blocking pool.
async fn hash_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password check task failed: {}", e)))?
}

pub async fn register(store: &dyn IdentityStore, tenant_id: &str, input: RegisterInput) -> Result<Profile, AppError> {
    let email = input.email.trim().to_lowercase();
    let name = input.name.trim().to_string();
    let mut errors = FieldErrors::default();
    if !is_valid_email(&email) {
        errors.push("email", "must be a valid email");
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("password", format!("must be at least {} characters", MIN_PASSWORD_LEN));
    }
    if name.is_empty() {
        errors.push("name", "is required");
    }
    errors.into_result()?;

    let user = User {
        id: Uuid::new_v4(),
        tenant_id: tenant_id.to_string(),
        email,
        name,
        password_hash: hash_blocking(input.password).await?,
        created_at: Utc::now(),
    };
    let user = store.create_user(user).await?;
    tracing::info!(tenant_id = %tenant_id, user_id = %user.id, "user registered");
    Ok(Profile {
        user_id: user.id,
        tenant_id: user.tenant_id,
        email: user.email,
        name: user.name,
    })
}

/// Wrong email and wrong password are indistinguishable to the caller.
pub async fn login(
    store: &dyn IdentityStore,
    tenant_id: &str,
    input: LoginInput,
    ttl: Duration,
) -> Result<LoginResult, AppError> {
    let Some(user) = store.find_user(tenant_id, input.email.trim()).await? else {
        tracing::info!(tenant_id = %tenant_id, "login failed: unknown email");
        return Err(AppError::Unauthenticated);
    };
    if !verify_blocking(input.password, user.password_hash.clone()).await? {
        tracing::info!(tenant_id = %tenant_id, user_id = %user.id, "login failed: bad password");
        return Err(AppError::Unauthenticated);
    }

    let now = Utc::now();
    match store.purge_expired_sessions(now).await {
        Ok(0) => {}
        Ok(purged) => tracing::debug!(purged, "expired sessions removed"),
        Err(e) => tracing::warn!(error = %e, "could not purge expired sessions"),
    }

    let token = generate_token();
    let expires_at = now + ttl;
    store.create_session(&token_digest(&token), &user, expires_at).await?;
    tracing::info!(tenant_id = %tenant_id, user_id = %user.id, "session created");
    Ok(LoginResult {
        token,
        session: SessionIdentity {
            user_id: user.id,
            tenant_id: user.tenant_id,
            email: user.email,
            name: user.name,
            expires_at,
        },
    })
}

pub async fn logout(store: &dyn IdentityStore, token: &str) -> Result<bool, AppError> {
    store.revoke_session(&token_digest(token)).await
}
