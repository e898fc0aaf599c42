//! Donation form: Amount -> Details -> Payment -> Success.

use super::amount::{format_amount, parse_amount};
use super::Notice;
use crate::config::DonationSettings;
use crate::drafts::{DraftKey, DraftStore};
use crate::error::AppError;
use crate::payments::{Frequency, IntentInput, PaymentIntent};
use crate::service::is_valid_email;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Issues a provider-side payment handle before the payment step renders.
#[async_trait]
pub trait PaymentHandles: Send + Sync {
    async fn request_handle(&self, input: &IntentInput) -> Result<PaymentIntent, AppError>;
}

/// Confirms a payment handle with the provider (card element, wallet).
#[async_trait]
pub trait PaymentConfirmer: Send + Sync {
    async fn confirm(&self, intent: &PaymentIntent) -> Result<(), AppError>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStep {
    #[default]
    Amount,
    Details,
    Payment,
    Success,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DonationInput {
    /// Minor units; `None` until a tile or a valid custom amount is entered.
    pub amount: Option<u64>,
    pub custom_amount: String,
    pub name: String,
    pub email: String,
    pub anonymous: bool,
    pub frequency: Frequency,
}

/// What `save_draft` persists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DonationDraft {
    pub step: DonationStep,
    pub input: DonationInput,
}

struct DraftBinding {
    store: Arc<dyn DraftStore>,
    key: DraftKey,
}

pub struct DonationForm {
    settings: DonationSettings,
    step: DonationStep,
    input: DonationInput,
    intent: Option<PaymentIntent>,
    completed: Option<PaymentIntent>,
    notice: Option<Notice>,
    drafts: Option<DraftBinding>,
}

impl DonationForm {
    pub fn new(settings: DonationSettings) -> Self {
        DonationForm {
            settings,
            step: DonationStep::Amount,
            input: DonationInput::default(),
            intent: None,
            completed: None,
            notice: None,
            drafts: None,
        }
    }

    /// Binds the form to a draft slot and restores whatever was saved there.
    /// A restored form never lands past Details: payment handles are not persisted.
    pub async fn resume(
        settings: DonationSettings,
        store: Arc<dyn DraftStore>,
        key: DraftKey,
    ) -> Result<Self, AppError> {
        let mut form = DonationForm::new(settings);
        if let Some(value) = store.restore(&key).await? {
            match serde_json::from_value::<DonationDraft>(value) {
                Ok(draft) => {
                    form.step = draft.step.min(DonationStep::Details);
                    form.input = draft.input;
                    if !form.can_continue() {
                        form.step = DonationStep::Amount;
                    }
                }
                Err(e) => {
                    tracing::warn!(form = %key.form, error = %e, "discarding unreadable donation draft");
                }
            }
        }
        form.drafts = Some(DraftBinding { store, key });
        Ok(form)
    }

    pub fn step(&self) -> DonationStep {
        self.step
    }

    pub fn input(&self) -> &DonationInput {
        &self.input
    }

    pub fn amount(&self) -> Option<u64> {
        self.input.amount
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Handle for the payment step.
    pub fn intent(&self) -> Option<&PaymentIntent> {
        self.intent.as_ref()
    }

    /// The confirmed payment, once on Success.
    pub fn completed(&self) -> Option<&PaymentIntent> {
        self.completed.as_ref()
    }

    /// `(label, minor units)` for each suggested tile.
    pub fn tiles(&self) -> Vec<(String, u64)> {
        self.settings
            .suggested_amounts
            .iter()
            .map(|&minor| (format_amount(minor, &self.settings.currency), minor))
            .collect()
    }

    pub fn select_tile(&mut self, minor: u64) {
        if self.step != DonationStep::Amount {
            return;
        }
        self.input.amount = Some(minor);
        self.input.custom_amount.clear();
    }

    pub fn set_custom_amount(&mut self, text: &str) {
        if self.step != DonationStep::Amount {
            return;
        }
        self.input.custom_amount = text.to_string();
        self.input.amount = parse_amount(text);
    }

    pub fn set_frequency(&mut self, frequency: Frequency) {
        self.input.frequency = frequency;
    }

    pub fn set_name(&mut self, name: &str) {
        self.input.name = name.to_string();
    }

    pub fn set_email(&mut self, email: &str) {
        self.input.email = email.to_string();
    }

    pub fn set_anonymous(&mut self, anonymous: bool) {
        self.input.anonymous = anonymous;
    }

    /// Enables "Continue" on the amount step.
    pub fn can_continue(&self) -> bool {
        self.input.amount.is_some_and(|a| a >= self.settings.minimum_amount)
    }

    /// Amount -> Details.
    pub fn continue_to_details(&mut self) -> bool {
        if self.step != DonationStep::Amount {
            return false;
        }
        if !self.can_continue() {
            self.notice = Some(Notice::new(format!(
                "Please enter an amount of at least {}.",
                format_amount(self.settings.minimum_amount, &self.settings.currency)
            )));
            return false;
        }
        self.notice = None;
        self.step = DonationStep::Details;
        true
    }

    fn details_problem(&self) -> Option<&'static str> {
        if self.input.anonymous {
            return None;
        }
        if self.input.name.trim().is_empty() {
            return Some("Please enter your name, or give anonymously.");
        }
        if !is_valid_email(self.input.email.trim()) {
            return Some("Please enter a valid email address.");
        }
        None
    }

    /// Details -> Payment. Requests the payment handle first; on failure stays on Details.
    pub async fn continue_to_payment(&mut self, handles: &dyn PaymentHandles) -> bool {
        if self.step != DonationStep::Details {
            return false;
        }
        if let Some(problem) = self.details_problem() {
            self.notice = Some(Notice::new(problem));
            return false;
        }
        let Some(amount) = self.input.amount else {
            return false;
        };
        let email = self.input.email.trim();
        let request = IntentInput {
            amount,
            currency: Some(self.settings.currency.clone()),
            email: (!self.input.anonymous && !email.is_empty()).then(|| email.to_string()),
            anonymous: self.input.anonymous,
            frequency: self.input.frequency,
        };
        match handles.request_handle(&request).await {
            Ok(intent) => {
                self.intent = Some(intent);
                self.notice = None;
                self.step = DonationStep::Payment;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "payment handle request failed");
                self.notice = Some(Notice::from_error(&e));
                false
            }
        }
    }

    /// Payment -> Success. Failure stays on Payment with the provider's message; the user may resubmit.
    pub async fn submit(&mut self, confirmer: &dyn PaymentConfirmer) -> bool {
        if self.step != DonationStep::Payment {
            return false;
        }
        let Some(intent) = self.intent.clone() else {
            return false;
        };
        if let Err(e) = confirmer.confirm(&intent).await {
            tracing::warn!(intent_id = %intent.id, error = %e, "payment confirmation failed");
            self.notice = Some(Notice::from_error(&e));
            return false;
        }
        self.input = DonationInput::default();
        self.intent = None;
        self.completed = Some(intent);
        self.notice = None;
        self.step = DonationStep::Success;
        if let Some(binding) = &self.drafts {
            if let Err(e) = binding.store.clear(&binding.key).await {
                tracing::warn!(form = %binding.key.form, error = %e, "failed to clear donation draft");
            }
        }
        true
    }

    /// Persists the current step and input to the bound draft slot. No-op when unbound.
    pub async fn save_draft(&self) -> Result<(), AppError> {
        let Some(binding) = &self.drafts else {
            return Ok(());
        };
        if self.step == DonationStep::Success {
            return Ok(());
        }
        let draft = DonationDraft {
            step: self.step,
            input: self.input.clone(),
        };
        let value = serde_json::to_value(&draft).map_err(|e| AppError::Internal(e.to_string()))?;
        binding.store.save(&binding.key, &value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiles_are_labelled_from_settings() {
        let form = DonationForm::new(DonationSettings::default());
        let tiles = form.tiles();
        assert_eq!(tiles[2], ("$75".to_string(), 7500));
        assert_eq!(tiles.len(), 5);
    }

    #[test]
    fn below_minimum_blocks_continue() {
        let mut form = DonationForm::new(DonationSettings::default());
        form.set_custom_amount("0.50");
        assert_eq!(form.amount(), Some(50));
        assert!(!form.can_continue());
        assert!(!form.continue_to_details());
        assert_eq!(form.step(), DonationStep::Amount);
        assert_eq!(form.notice().unwrap().message, "Please enter an amount of at least $1.");
        form.dismiss_notice();
        assert!(form.notice().is_none());
    }

    #[test]
    fn amount_is_frozen_after_amount_step() {
        let mut form = DonationForm::new(DonationSettings::default());
        form.select_tile(5000);
        assert!(form.continue_to_details());
        form.select_tile(25000);
        form.set_custom_amount("3");
        assert_eq!(form.amount(), Some(5000));
        assert!(!form.continue_to_details());
    }
}
