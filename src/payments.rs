//! Donation payment intents. Card data never touches this server; the provider's hosted element confirms the intent.

use crate::config::DonationSettings;
use crate::error::{AppError, FieldErrors};
use crate::service::is_valid_email;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    OneTime,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::OneTime => "one_time",
            Frequency::Monthly => "monthly",
        }
    }
}

/// Body of `POST /api/create-payment-intent`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct IntentInput {
    /// Minor currency units.
    pub amount: u64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub frequency: Frequency,
}

/// Validated request handed to the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntentRequest {
    pub tenant_id: String,
    pub amount: u64,
    pub currency: String,
    pub receipt_email: Option<String>,
    pub frequency: Frequency,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: u64,
    pub currency: String,
}

impl IntentInput {
    pub fn into_request(self, tenant_id: &str, donation: &DonationSettings) -> Result<IntentRequest, AppError> {
        let mut errors = FieldErrors::default();
        if self.amount < donation.minimum_amount {
            errors.push("amount", format!("must be at least {} minor units", donation.minimum_amount));
        }
        let currency = self
            .currency
            .map(|c| c.trim().to_lowercase())
            .unwrap_or_else(|| donation.currency.clone());
        if currency != donation.currency {
            errors.push("currency", format!("must be {}", donation.currency));
        }
        let email = self.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        if let Some(e) = &email {
            if !is_valid_email(e) {
                errors.push("email", "must be a valid email");
            }
        }
        errors.into_result()?;
        Ok(IntentRequest {
            tenant_id: tenant_id.to_string(),
            amount: self.amount,
            currency,
            receipt_email: if self.anonymous { None } else { email },
            frequency: self.frequency,
        })
    }
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Provider failures are `AppError::Provider` carrying the provider's message.
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, AppError>;
}

/// Used when no secret key is configured.
pub struct DisabledPaymentProvider;

#[async_trait]
impl PaymentProvider for DisabledPaymentProvider {
    async fn create_intent(&self, _request: &IntentRequest) -> Result<PaymentIntent, AppError> {
        Err(AppError::Provider("payments are not configured".into()))
    }
}

/// Stripe-compatible REST provider.
pub struct HttpPaymentProvider {
    http: reqwest::Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

impl HttpPaymentProvider {
    pub fn new(api_base: impl Into<String>, secret_key: impl Into<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("http client: {}", e)))?;
        Ok(HttpPaymentProvider {
            http,
            api_base: api_base.into(),
            secret_key: secret_key.into(),
        })
    }
}

#[async_trait]
impl PaymentProvider for HttpPaymentProvider {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, AppError> {
        let mut form: Vec<(&str, String)> = vec![
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("automatic_payment_methods[enabled]", "true".into()),
            ("metadata[tenant_id]", request.tenant_id.clone()),
            ("metadata[frequency]", request.frequency.as_str().into()),
        ];
        if let Some(email) = &request.receipt_email {
            form.push(("receipt_email", email.clone()));
        }

        let url = format!("{}/v1/payment_intents", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("payment provider unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ProviderErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => format!("payment provider returned {}", status),
            };
            tracing::warn!(tenant_id = %request.tenant_id, %status, "payment intent rejected");
            return Err(AppError::Provider(message));
        }
        let intent: PaymentIntent = response
            .json::<ProviderIntent>()
            .await
            .map(PaymentIntent::from)
            .map_err(|e| AppError::Provider(format!("unreadable payment provider response: {}", e)))?;
        tracing::info!(tenant_id = %request.tenant_id, intent_id = %intent.id, amount = intent.amount, "payment intent created");
        Ok(intent)
    }
}

/// Provider responses use snake_case.
#[derive(Deserialize)]
struct ProviderIntent {
    id: String,
    client_secret: String,
    amount: u64,
    currency: String,
}

impl From<ProviderIntent> for PaymentIntent {
    fn from(p: ProviderIntent) -> Self {
        PaymentIntent {
            id: p.id,
            client_secret: p.client_secret,
            amount: p.amount,
            currency: p.currency,
        }
    }
}
