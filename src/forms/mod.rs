//! Multi-step form controllers for the donation and apply pages.
//!
//! Controllers hold transient input, move forward only, and turn provider failures into a
//! dismissible [`Notice`]. Nothing is retried automatically; the user resubmits.

mod amount;
mod apply;
mod donation;

pub use amount::{format_amount, parse_amount};
pub use apply::{ApplicationInput, ApplicationSubmitter, ApplyForm, SubmittedApplication, MIN_INTERESTS_LEN};
pub use donation::{DonationDraft, DonationForm, DonationInput, DonationStep, PaymentConfirmer, PaymentHandles};

use crate::error::AppError;

/// User-facing message; cleared by `dismiss_notice` or the next successful transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Notice { message: message.into() }
    }

    /// Domain and provider messages are shown as-is, without the error-kind prefix.
    pub fn from_error(err: &AppError) -> Self {
        let message = match err {
            AppError::Provider(m)
            | AppError::Conflict(m)
            | AppError::Validation(m)
            | AppError::BadRequest(m)
            | AppError::NotFound(m) => m.clone(),
            AppError::InvalidFields(fields) => fields.to_string(),
            other => other.to_string(),
        };
        Notice { message }
    }
}
