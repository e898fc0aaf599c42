//! `auth.*` procedures. Register and login are public and take the tenant from `X-Tenant-ID`.

use crate::auth::{self, LoginInput, RegisterInput};
use crate::error::AppError;
use crate::extractors::{Caller, TenantId};
use crate::response::{created, ok};
use crate::rpc::parse_raw_input;
use crate::state::AppState;
use axum::{body::Bytes, extract::State, response::Response};
use serde::de::DeserializeOwned;

fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    let value = parse_raw_input(body)?;
    serde_json::from_value(value).map_err(|e| AppError::Validation(format!("invalid input: {}", e)))
}

pub async fn register(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    body: Bytes,
) -> Result<Response, AppError> {
    let input: RegisterInput = decode_body(&body)?;
    let profile = auth::register(state.identity.as_ref(), &tenant_id, input).await?;
    Ok(created(profile))
}

pub async fn login(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    body: Bytes,
) -> Result<Response, AppError> {
    let input: LoginInput = decode_body(&body)?;
    let result = auth::login(state.identity.as_ref(), &tenant_id, input, state.session_ttl()).await?;
    Ok(ok(result))
}

pub async fn logout(State(state): State<AppState>, caller: Caller) -> Result<Response, AppError> {
    auth::logout(state.identity.as_ref(), &caller.token).await?;
    tracing::info!(tenant_id = %caller.identity.tenant_id, user_id = %caller.identity.user_id, "session revoked");
    Ok(ok(serde_json::json!({ "loggedOut": true })))
}

pub async fn me(caller: Caller) -> Result<Response, AppError> {
    Ok(ok(caller.identity))
}
