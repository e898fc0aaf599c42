//! HTTP client for this server's public procedures. Backs the form controllers outside tests.

use crate::config::Settings;
use crate::error::{AppError, FieldErrors};
use crate::extractors::TENANT_ID_HEADER;
use crate::forms::{ApplicationInput, ApplicationSubmitter, PaymentHandles, SubmittedApplication};
use crate::payments::{IntentInput, PaymentIntent};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000";

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tenant_id: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, tenant_id: impl Into<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("http client: {}", e)))?;
        Ok(ApiClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tenant_id: tenant_id.into(),
            token: None,
        })
    }

    /// Uses `API_BASE_URL` when set.
    pub fn from_settings(settings: &Settings, tenant_id: impl Into<String>) -> Result<Self, AppError> {
        let base = settings
            .api_base_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL);
        Self::new(base, tenant_id)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.post(&url).header(TENANT_ID_HEADER, &self.tenant_id).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("could not reach the server: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(match response.json::<ErrorEnvelope>().await {
                Ok(body) => error_from_code(&body.error.code, body.error.message, body.error.details),
                Err(_) => AppError::Provider(format!("server returned {}", status)),
            });
        }
        response
            .json::<DataEnvelope<T>>()
            .await
            .map(|envelope| envelope.data)
            .map_err(|e| AppError::Provider(format!("unreadable server response: {}", e)))
    }
}

/// Rebuilds the server's error kind so messages keep their meaning on this side.
fn error_from_code(code: &str, message: String, details: Option<serde_json::Value>) -> AppError {
    match code {
        "unauthenticated" => AppError::Unauthenticated,
        "not_found" => AppError::NotFound(message),
        "validation_error" => {
            let fields = details.and_then(|d| serde_json::from_value::<FieldErrors>(d).ok());
            match fields {
                Some(fields) if !fields.0.is_empty() => AppError::InvalidFields(fields),
                _ => AppError::Validation(message.strip_prefix("validation: ").unwrap_or(&message).to_string()),
            }
        }
        "conflict" => AppError::Conflict(message),
        "bad_request" => AppError::BadRequest(message),
        _ => AppError::Provider(message),
    }
}

#[async_trait]
impl ApplicationSubmitter for ApiClient {
    async fn submit_application(&self, input: &ApplicationInput) -> Result<SubmittedApplication, AppError> {
        self.post("/api/trpc/applications.submit", input).await
    }
}

#[async_trait]
impl PaymentHandles for ApiClient {
    async fn request_handle(&self, input: &IntentInput) -> Result<PaymentIntent, AppError> {
        self.post("/api/create-payment-intent", input).await
    }
}
