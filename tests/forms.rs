//! Donation and apply form controllers driven with fake providers.

use async_trait::async_trait;
use camp_api::config::DonationSettings;
use camp_api::drafts::{DraftKey, DraftStore, MemoryDraftStore};
use camp_api::forms::{
    ApplicationInput, ApplicationSubmitter, ApplyForm, DonationForm, DonationStep, PaymentConfirmer, PaymentHandles,
    SubmittedApplication,
};
use camp_api::payments::{IntentInput, PaymentIntent};
use camp_api::AppError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct FakeHandles {
    requests: Mutex<Vec<IntentInput>>,
    fail_with: Option<String>,
}

impl FakeHandles {
    fn ok() -> Self {
        FakeHandles {
            requests: Mutex::new(Vec::new()),
            fail_with: None,
        }
    }

    fn failing(message: &str) -> Self {
        FakeHandles {
            requests: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }
}

#[async_trait]
impl PaymentHandles for FakeHandles {
    async fn request_handle(&self, input: &IntentInput) -> Result<PaymentIntent, AppError> {
        self.requests.lock().unwrap().push(input.clone());
        if let Some(message) = &self.fail_with {
            return Err(AppError::Provider(message.clone()));
        }
        Ok(PaymentIntent {
            id: "pi_1".into(),
            client_secret: "pi_1_secret".into(),
            amount: input.amount,
            currency: "usd".into(),
        })
    }
}

/// Declines the first `declines` confirmations.
struct FakeConfirmer {
    declines: AtomicUsize,
}

#[async_trait]
impl PaymentConfirmer for FakeConfirmer {
    async fn confirm(&self, _intent: &PaymentIntent) -> Result<(), AppError> {
        if self.declines.load(Ordering::SeqCst) > 0 {
            self.declines.fetch_sub(1, Ordering::SeqCst);
            return Err(AppError::Provider("Your card has insufficient funds.".into()));
        }
        Ok(())
    }
}

fn details_form() -> DonationForm {
    let mut form = DonationForm::new(DonationSettings::default());
    form.select_tile(7500);
    assert!(form.continue_to_details());
    form
}

#[test]
fn tile_and_custom_amounts() {
    let mut form = DonationForm::new(DonationSettings::default());
    let (label, minor) = form.tiles().into_iter().find(|(label, _)| label == "$75").unwrap();
    assert_eq!(label, "$75");
    form.select_tile(minor);
    assert_eq!(form.amount(), Some(7500));
    assert!(form.can_continue());

    form.set_custom_amount("12.50");
    assert_eq!(form.amount(), Some(1250));
    assert!(form.can_continue());

    for text in ["0", ""] {
        form.set_custom_amount(text);
        assert_eq!(form.amount(), None, "{:?}", text);
        assert!(!form.can_continue());
    }
}

#[tokio::test]
async fn details_need_a_valid_email_unless_anonymous() {
    let handles = FakeHandles::ok();
    let mut form = details_form();
    form.set_name("June");
    form.set_email("no-at-sign.com");
    assert!(!form.continue_to_payment(&handles).await);
    assert_eq!(form.step(), DonationStep::Details);
    assert_eq!(form.notice().unwrap().message, "Please enter a valid email address.");
    assert!(handles.requests.lock().unwrap().is_empty());

    form.set_email("june@camp.org");
    assert!(form.continue_to_payment(&handles).await);
    assert_eq!(form.step(), DonationStep::Payment);
    assert!(form.notice().is_none());
    assert_eq!(form.intent().unwrap().client_secret, "pi_1_secret");
    let requests = handles.requests.lock().unwrap();
    assert_eq!(requests[0].amount, 7500);
    assert_eq!(requests[0].email.as_deref(), Some("june@camp.org"));
}

#[tokio::test]
async fn anonymous_donors_skip_name_and_email() {
    let handles = FakeHandles::ok();
    let mut form = details_form();
    form.set_anonymous(true);
    form.set_email("no-at-sign.com");
    assert!(form.continue_to_payment(&handles).await);
    let requests = handles.requests.lock().unwrap();
    assert!(requests[0].anonymous);
    assert_eq!(requests[0].email, None);
}

#[tokio::test]
async fn handle_failure_stays_on_details() {
    let handles = FakeHandles::failing("payment provider unreachable: timed out");
    let mut form = details_form();
    form.set_name("June");
    form.set_email("june@camp.org");
    assert!(!form.continue_to_payment(&handles).await);
    assert_eq!(form.step(), DonationStep::Details);
    assert_eq!(form.notice().unwrap().message, "payment provider unreachable: timed out");
    assert_eq!(handles.requests.lock().unwrap().len(), 1);

    form.dismiss_notice();
    assert!(form.notice().is_none());
    assert!(form.continue_to_payment(&FakeHandles::ok()).await);
}

#[tokio::test]
async fn decline_stays_on_payment_then_user_retry_succeeds() {
    let confirmer = FakeConfirmer {
        declines: AtomicUsize::new(1),
    };
    let mut form = details_form();
    form.set_name("June");
    form.set_email("june@camp.org");
    assert!(form.continue_to_payment(&FakeHandles::ok()).await);

    assert!(!form.submit(&confirmer).await);
    assert_eq!(form.step(), DonationStep::Payment);
    assert_eq!(form.notice().unwrap().message, "Your card has insufficient funds.");
    assert_eq!(form.input().name, "June");

    assert!(form.submit(&confirmer).await);
    assert_eq!(form.step(), DonationStep::Success);
    assert_eq!(form.input(), &Default::default());
    assert_eq!(form.completed().unwrap().id, "pi_1");
    assert!(form.notice().is_none());
}

#[tokio::test]
async fn draft_is_resumed_and_cleared_on_success() {
    let store: Arc<dyn DraftStore> = Arc::new(MemoryDraftStore::new());
    let key = DraftKey::new("alpha", "june", "donate");

    let mut form = DonationForm::resume(DonationSettings::default(), store.clone(), key.clone())
        .await
        .unwrap();
    assert_eq!(form.step(), DonationStep::Amount);
    form.set_custom_amount("40");
    assert!(form.continue_to_details());
    form.set_name("June");
    form.set_email("june@camp.org");
    form.save_draft().await.unwrap();

    let mut form = DonationForm::resume(DonationSettings::default(), store.clone(), key.clone())
        .await
        .unwrap();
    assert_eq!(form.step(), DonationStep::Details);
    assert_eq!(form.amount(), Some(4000));
    assert_eq!(form.input().email, "june@camp.org");

    assert!(form.continue_to_payment(&FakeHandles::ok()).await);
    form.save_draft().await.unwrap();
    let resumed = DonationForm::resume(DonationSettings::default(), store.clone(), key.clone())
        .await
        .unwrap();
    assert_eq!(resumed.step(), DonationStep::Details);

    let confirmer = FakeConfirmer {
        declines: AtomicUsize::new(0),
    };
    assert!(form.submit(&confirmer).await);
    assert_eq!(store.restore(&key).await.unwrap(), None);
}

struct FakeSubmitter {
    calls: AtomicUsize,
    result: Result<SubmittedApplication, String>,
}

#[async_trait]
impl ApplicationSubmitter for FakeSubmitter {
    async fn submit_application(&self, _input: &ApplicationInput) -> Result<SubmittedApplication, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(AppError::Conflict)
    }
}

fn filled_apply_form(interests: &str) -> ApplyForm {
    let mut form = ApplyForm::new();
    form.input.name = "Juniper Lee".into();
    form.input.email = "june@camp.org".into();
    form.input.interests = interests.into();
    form
}

const LONG_INTERESTS: &str = "Welding the temple, cooking for build week and running the sound camp.";

#[tokio::test]
async fn short_interests_are_caught_before_any_call() {
    let submitter = FakeSubmitter {
        calls: AtomicUsize::new(0),
        result: Err("unused".into()),
    };
    let mut form = filled_apply_form("I like art.");
    assert!(!form.submit(&submitter).await);
    assert!(form.notice().unwrap().message.contains("tell us a bit more"));
    assert_eq!(submitter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn server_conflict_is_shown_verbatim() {
    let submitter = FakeSubmitter {
        calls: AtomicUsize::new(0),
        result: Err("an application for this email is already under review".into()),
    };
    let mut form = filled_apply_form(LONG_INTERESTS);
    assert!(!form.submit(&submitter).await);
    assert_eq!(
        form.notice().unwrap().message,
        "an application for this email is already under review"
    );
    assert_eq!(form.input.name, "Juniper Lee");
}

#[tokio::test]
async fn successful_application_clears_input() {
    let submitter = FakeSubmitter {
        calls: AtomicUsize::new(0),
        result: Ok(SubmittedApplication {
            id: "app-1".into(),
            status: "pending".into(),
            submitted_at: None,
        }),
    };
    let mut form = filled_apply_form(LONG_INTERESTS);
    assert!(form.submit(&submitter).await);
    assert_eq!(form.input, ApplicationInput::default());
    assert_eq!(form.submitted().unwrap().status, "pending");
    assert_eq!(submitter.calls.load(Ordering::SeqCst), 1);
}
