//! Public site routes and the signed-in caller's form drafts.

use crate::handlers::{drafts, public};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn public_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/create-payment-intent", post(public::create_payment_intent))
        .route("/api/site", get(public::site))
        .with_state(state)
}

pub fn draft_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/drafts/:form",
            get(drafts::get_draft).put(drafts::put_draft).delete(drafts::delete_draft),
        )
        .with_state(state)
}
