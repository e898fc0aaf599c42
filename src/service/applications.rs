//! Public membership application intake, stored through the `applications` router.

use crate::case::keys_to_snake_case;
use crate::config::ResolvedRouter;
use crate::error::AppError;
use crate::service::entity::{EntityService, Scope};
use crate::service::validation::InputValidator;
use serde_json::{Map, Value};

pub const APPLICATIONS_ROUTER: &str = "applications";
pub const STATUS_PENDING: &str = "pending";
pub const ALREADY_UNDER_REVIEW: &str = "an application for this email is already under review";

/// Validate and store one application. Status is always `pending`; a pending application with the same email is a conflict.
pub async fn submit_application(
    entities: &dyn EntityService,
    router: &ResolvedRouter,
    tenant_id: &str,
    input: Map<String, Value>,
) -> Result<Value, AppError> {
    let mut input = keys_to_snake_case(input);
    if input.contains_key("status") {
        return Err(AppError::Validation("status is assigned by the server".into()));
    }
    input.insert("status".into(), Value::String(STATUS_PENDING.into()));
    let input = InputValidator::validate_create(router, input)?;

    let scope = Scope::anonymous(tenant_id);
    let mut pending = Map::new();
    pending.insert("email".into(), input["email"].clone());
    pending.insert("status".into(), Value::String(STATUS_PENDING.into()));
    let Some(created) = entities.create_unless(&scope, router, &pending, input).await? else {
        tracing::info!(tenant_id = %tenant_id, "duplicate pending application rejected");
        return Err(AppError::Conflict(ALREADY_UNDER_REVIEW.into()));
    };
    tracing::info!(tenant_id = %tenant_id, id = %created["id"], "application submitted");
    Ok(created)
}
