//! Axum router wiring.
//!
//! The group wildcard does not match an empty tail, so `/v1/metrics/group`
//! is routed explicitly and `/v1/metrics/group/` lands in the fallback;
//! both answer `no_group`.

use axum::{routing::get, Router};

use crate::{api, app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/v1/metrics", get(api::all))
        .route("/v1/metrics/one/*name", get(api::one))
        .route("/v1/metrics/group", get(api::group_missing))
        .route("/v1/metrics/group/*prefix", get(api::group))
        .fallback(api::fallback)
        .with_state(state)
}
