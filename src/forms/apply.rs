//! Apply form: one step, checked locally before the submitter is called.

use super::Notice;
use crate::error::AppError;
use crate::service::is_valid_email;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const MIN_INTERESTS_LEN: usize = 50;

#[async_trait]
pub trait ApplicationSubmitter: Send + Sync {
    async fn submit_application(&self, input: &ApplicationInput) -> Result<SubmittedApplication, AppError>;
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationInput {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    pub interests: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub experience: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub contribution: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub referral: String,
}

/// Server acknowledgement of `applications.submit`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedApplication {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub submitted_at: Option<String>,
}

#[derive(Default)]
pub struct ApplyForm {
    pub input: ApplicationInput,
    notice: Option<Notice>,
    submitted: Option<SubmittedApplication>,
}

impl ApplyForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn submitted(&self) -> Option<&SubmittedApplication> {
        self.submitted.as_ref()
    }

    fn local_problem(&self) -> Option<String> {
        if self.input.name.trim().chars().count() < 2 {
            return Some("Please enter your name.".into());
        }
        if !is_valid_email(self.input.email.trim()) {
            return Some("Please enter a valid email address.".into());
        }
        let interests = self.input.interests.trim().chars().count();
        if interests < MIN_INTERESTS_LEN {
            return Some(format!(
                "Please tell us a bit more about your interests (at least {} characters, {} so far).",
                MIN_INTERESTS_LEN, interests
            ));
        }
        None
    }

    /// Local checks first; the submitter is called only when they pass. Server messages are shown verbatim.
    pub async fn submit(&mut self, submitter: &dyn ApplicationSubmitter) -> bool {
        if let Some(problem) = self.local_problem() {
            self.notice = Some(Notice::new(problem));
            return false;
        }
        let mut input = self.input.clone();
        input.name = input.name.trim().to_string();
        input.email = input.email.trim().to_string();
        input.interests = input.interests.trim().to_string();
        match submitter.submit_application(&input).await {
            Ok(receipt) => {
                self.input = ApplicationInput::default();
                self.submitted = Some(receipt);
                self.notice = None;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "application submission failed");
                self.notice = Some(Notice::from_error(&e));
                false
            }
        }
    }
}
