//! Procedure routes under `/api/trpc`. Fixed procedures are registered before the catalog catch-all.

use crate::handlers::{auth, public, rpc};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn rpc_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/trpc/auth.register", post(auth::register))
        .route("/api/trpc/auth.login", post(auth::login))
        .route("/api/trpc/auth.logout", post(auth::logout))
        .route("/api/trpc/auth.me", get(auth::me).post(auth::me))
        .route("/api/trpc/applications.submit", post(public::submit))
        .route("/api/trpc/:procedure", get(rpc::query).post(rpc::call))
        .with_state(state)
}
