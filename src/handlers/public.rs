//! Public endpoints for the marketing site: application submission, payment intents, site content.

use crate::error::AppError;
use crate::extractors::TenantId;
use crate::icons;
use crate::payments::IntentInput;
use crate::response::{created, ok};
use crate::rpc::parse_raw_input;
use crate::service::applications::{submit_application, APPLICATIONS_ROUTER};
use crate::state::AppState;
use axum::{body::Bytes, extract::State, response::Response};
use serde_json::{json, Value};

/// POST /api/trpc/applications.submit
pub async fn submit(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    body: Bytes,
) -> Result<Response, AppError> {
    let router = state
        .catalog
        .router(APPLICATIONS_ROUTER)
        .ok_or_else(|| AppError::NotFound("applications are not enabled".into()))?;
    let input = match parse_raw_input(&body)? {
        Value::Object(map) => map,
        _ => return Err(AppError::Validation("input must be an object".into())),
    };
    let mut created_app = submit_application(state.entities.as_ref(), router, &tenant_id, input).await?;
    crate::case::value_keys_to_camel_case(&mut created_app);
    Ok(created(json!({
        "id": created_app["id"],
        "status": created_app["status"],
        "submittedAt": created_app["createdAt"],
    })))
}

/// POST /api/create-payment-intent
pub async fn create_payment_intent(
    State(state): State<AppState>,
    TenantId(tenant_id): TenantId,
    body: Bytes,
) -> Result<Response, AppError> {
    let input: IntentInput = serde_json::from_value(parse_raw_input(&body)?)
        .map_err(|e| AppError::Validation(format!("invalid input: {}", e)))?;
    let request = input.into_request(&tenant_id, &state.site.donation)?;
    let intent = state.payments.create_intent(&request).await?;
    Ok(ok(intent))
}

/// GET /api/site: site content with icon keys resolved, plus the client-facing settings.
pub async fn site(State(state): State<AppState>) -> Response {
    let site = &state.site;
    let features: Vec<Value> = site
        .features
        .iter()
        .map(|f| {
            json!({
                "title": f.title,
                "description": f.description,
                "icon": icons::lookup(&f.icon).name(),
            })
        })
        .collect();
    ok(json!({
        "name": site.name,
        "tagline": site.tagline,
        "features": features,
        "donation": {
            "currency": site.donation.currency,
            "suggestedAmounts": site.donation.suggested_amounts,
            "minimumAmount": site.donation.minimum_amount,
        },
        "apiBaseUrl": state.settings.api_base_url,
        "paymentPublishableKey": state.settings.payment_publishable_key,
    }))
}
