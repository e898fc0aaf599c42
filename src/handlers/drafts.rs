//! Draft API for the signed-in caller: get, save (upsert), and clear one form draft.

use crate::drafts::DraftKey;
use crate::error::AppError;
use crate::extractors::Caller;
use crate::response::ok;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

const MAX_FORM_NAME: usize = 64;

fn draft_key(caller: &Caller, form: String) -> Result<DraftKey, AppError> {
    let valid = !form.is_empty()
        && form.len() <= MAX_FORM_NAME
        && form.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(AppError::BadRequest(format!("invalid form name: {}", form)));
    }
    Ok(DraftKey::new(
        caller.identity.tenant_id.clone(),
        caller.identity.user_id.to_string(),
        form,
    ))
}

/// GET /api/drafts/:form
pub async fn get_draft(
    State(state): State<AppState>,
    caller: Caller,
    Path(form): Path<String>,
) -> Result<Response, AppError> {
    let key = draft_key(&caller, form)?;
    let value = state
        .drafts
        .restore(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("draft {}", key.form)))?;
    Ok(ok(value))
}

/// PUT /api/drafts/:form
pub async fn put_draft(
    State(state): State<AppState>,
    caller: Caller,
    Path(form): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let key = draft_key(&caller, form)?;
    state.drafts.save(&key, &body).await?;
    Ok(ok(body))
}

/// DELETE /api/drafts/:form
pub async fn delete_draft(
    State(state): State<AppState>,
    caller: Caller,
    Path(form): Path<String>,
) -> Result<Response, AppError> {
    let key = draft_key(&caller, form)?;
    if !state.drafts.clear(&key).await? {
        return Err(AppError::NotFound(format!("draft {}", key.form)));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}
