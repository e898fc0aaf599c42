//! Catalog procedures at `/api/trpc/:procedure`: lookup, then session, then input, then one service call.

use crate::error::AppError;
use crate::extractors::Caller;
use crate::rpc::{execute, parse_raw_input, validate_call};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
pub struct QueryParams {
    input: Option<String>,
}

/// GET: queries only, input from `?input=<json>`.
pub async fn query(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    caller: Result<Caller, AppError>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let (_, op) = state
        .catalog
        .procedure(&procedure)
        .ok_or_else(|| AppError::NotFound(format!("procedure {}", procedure)))?;
    if !op.is_query() {
        return Err(AppError::BadRequest(format!("{} is a mutation; use POST", procedure)));
    }
    let caller = caller?;
    let Query(params) = params.map_err(|e| AppError::Validation(format!("invalid query string: {}", e.body_text())))?;
    let input = match params.input.as_deref() {
        Some(raw) => parse_raw_input(raw.as_bytes())?,
        None => Value::Null,
    };
    run(&state, &caller, &procedure, input).await
}

/// POST: mutations, and queries from clients that send input in the body.
pub async fn call(
    State(state): State<AppState>,
    Path(procedure): Path<String>,
    caller: Result<Caller, AppError>,
    body: Bytes,
) -> Result<Response, AppError> {
    state
        .catalog
        .procedure(&procedure)
        .ok_or_else(|| AppError::NotFound(format!("procedure {}", procedure)))?;
    let caller = caller?;
    let input = parse_raw_input(&body)?;
    run(&state, &caller, &procedure, input).await
}

async fn run(state: &AppState, caller: &Caller, procedure: &str, input: Value) -> Result<Response, AppError> {
    let (router, op) = state
        .catalog
        .procedure(procedure)
        .ok_or_else(|| AppError::NotFound(format!("procedure {}", procedure)))?;
    let scope = caller.scope();
    let validated = validate_call(router, op, input).map_err(|e| {
        tracing::debug!(procedure = %procedure, tenant_id = %scope.tenant_id, error = %e, "rpc input rejected");
        e
    })?;
    let output = execute(state.entities.as_ref(), &scope, router, validated).await?;
    tracing::info!(
        procedure = %procedure,
        tenant_id = %scope.tenant_id,
        user_id = %caller.identity.user_id,
        "rpc call"
    );
    Ok(output.into_response())
}
