//! Authenticated caller, resolved from a bearer token or the session cookie.

use crate::auth::{token_digest, SessionIdentity};
use crate::error::AppError;
use crate::service::Scope;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap,
    },
};

pub const SESSION_COOKIE: &str = "camp_session";

/// The session's identity plus the raw token (needed for logout). Tenant always comes from the session.
#[derive(Clone, Debug)]
pub struct Caller {
    pub identity: SessionIdentity,
    pub token: String,
}

impl Caller {
    pub fn scope(&self) -> Scope {
        Scope::user(self.identity.tenant_id.clone(), self.identity.user_id)
    }
}

/// Bearer token first, then the `camp_session` cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = session_token(&parts.headers).ok_or(AppError::Unauthenticated)?;
        let identity = state
            .identity
            .resolve_session(&token_digest(&token), chrono::Utc::now())
            .await?
            .ok_or(AppError::Unauthenticated)?;
        Ok(Caller { identity, token })
    }
}
