//! Route builders. `app` merges them and adds the body limit and request tracing.

mod common;
mod public;
mod rpc;

pub use common::common_routes;
pub use public::{draft_routes, public_routes};
pub use rpc::rpc_routes;

use crate::state::AppState;
use axum::Router;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

pub fn app(state: AppState) -> Router {
    let max_body = state.settings.max_body_bytes;
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(rpc_routes(state.clone()))
        .merge(public_routes(state.clone()))
        .merge(draft_routes(state))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(TraceLayer::new_for_http())
}
