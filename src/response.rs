//! Response envelope: `{ "data": ..., "meta"?: ... }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Serialize)]
pub struct Meta {
    pub count: u64,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(Envelope { data, meta: None })).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(Envelope { data, meta: None })).into_response()
}

pub fn ok_many<T: Serialize>(data: Vec<T>) -> Response {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(Envelope {
            data,
            meta: Some(Meta { count }),
        }),
    )
        .into_response()
}
