//! Catalog procedure pipeline: parse input, validate it against the router schema, make exactly one service call.
//! Authentication happens before anything here runs.

use crate::case::{keys_to_snake_case, value_keys_to_camel_case};
use crate::config::{Operation, ResolvedRouter};
use crate::error::{AppError, FieldErrors};
use crate::service::{EntityService, InputValidator, ListQuery, Scope, MAX_LIST_LIMIT};
use axum::response::Response;
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, PartialEq)]
pub enum RpcOutput {
    Created(Value),
    One(Value),
    Many(Vec<Value>),
}

impl RpcOutput {
    /// Keys converted to camelCase, wrapped in the response envelope.
    pub fn into_response(self) -> Response {
        match self {
            RpcOutput::Created(mut v) => {
                value_keys_to_camel_case(&mut v);
                crate::response::created(v)
            }
            RpcOutput::One(mut v) => {
                value_keys_to_camel_case(&mut v);
                crate::response::ok(v)
            }
            RpcOutput::Many(mut rows) => {
                for row in rows.iter_mut() {
                    value_keys_to_camel_case(row);
                }
                crate::response::ok_many(rows)
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IdInput {
    id: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdateInput {
    id: String,
    data: Map<String, Value>,
}

#[derive(Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListInput {
    limit: Option<u32>,
    offset: Option<u32>,
    filters: Option<Map<String, Value>>,
}

/// Input as received: empty bodies and absent `?input=` become null.
pub fn parse_raw_input(raw: &[u8]) -> Result<Value, AppError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(raw).map_err(|e| AppError::Validation(format!("malformed JSON input: {}", e)))
}

fn decode<T: for<'de> Deserialize<'de>>(input: Value) -> Result<T, AppError> {
    serde_json::from_value(input).map_err(|e| AppError::Validation(format!("invalid input: {}", e)))
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        let mut errors = FieldErrors::default();
        errors.push("id", "must be a valid UUID");
        AppError::InvalidFields(errors)
    })
}

/// Validated call, ready for the service. Building one never touches the service.
#[derive(Debug, PartialEq)]
pub enum ValidatedCall {
    Create(Map<String, Value>),
    List(ListQuery),
    Get(Uuid),
    Update(Uuid, Map<String, Value>),
    Delete(Uuid),
}

pub fn validate_call(router: &ResolvedRouter, op: Operation, input: Value) -> Result<ValidatedCall, AppError> {
    match op {
        Operation::Create => match input {
            Value::Object(map) => Ok(ValidatedCall::Create(InputValidator::validate_create(
                router,
                keys_to_snake_case(map),
            )?)),
            _ => Err(AppError::Validation("input must be an object".into())),
        },
        Operation::List => {
            let list: ListInput = if input.is_null() { ListInput::default() } else { decode(input)? };
            let mut errors = FieldErrors::default();
            if let Some(limit) = list.limit {
                if limit == 0 || limit > MAX_LIST_LIMIT {
                    errors.push("limit", format!("must be between 1 and {}", MAX_LIST_LIMIT));
                }
            }
            errors.into_result()?;
            let filters = InputValidator::validate_filters(router, keys_to_snake_case(list.filters.unwrap_or_default()))?;
            Ok(ValidatedCall::List(ListQuery::new(filters, list.limit, list.offset)))
        }
        Operation::Get => {
            let input: IdInput = decode(input)?;
            Ok(ValidatedCall::Get(parse_id(&input.id)?))
        }
        Operation::Update => {
            let input: UpdateInput = decode(input)?;
            let id = parse_id(&input.id)?;
            let data = InputValidator::validate_patch(router, keys_to_snake_case(input.data))?;
            Ok(ValidatedCall::Update(id, data))
        }
        Operation::Delete => {
            let input: IdInput = decode(input)?;
            Ok(ValidatedCall::Delete(parse_id(&input.id)?))
        }
    }
}

/// One service call; domain errors propagate unchanged.
pub async fn execute(
    entities: &dyn EntityService,
    scope: &Scope,
    router: &ResolvedRouter,
    call: ValidatedCall,
) -> Result<RpcOutput, AppError> {
    Ok(match call {
        ValidatedCall::Create(input) => RpcOutput::Created(entities.create(scope, router, input).await?),
        ValidatedCall::List(query) => RpcOutput::Many(entities.list(scope, router, &query).await?),
        ValidatedCall::Get(id) => RpcOutput::One(entities.get(scope, router, id).await?),
        ValidatedCall::Update(id, patch) => RpcOutput::One(entities.update(scope, router, id, patch).await?),
        ValidatedCall::Delete(id) => RpcOutput::One(entities.delete(scope, router, id).await?),
    })
}
