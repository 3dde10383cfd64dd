//! Metric query routes.
//!
//! - `GET /v1/metrics`                 : full dump
//! - `GET /v1/metrics/one/{*name}`     : single metric
//! - `GET /v1/metrics/group/{*prefix}` : every metric under a prefix
//!
//! Selection happens on the request task; callback metrics are then
//! evaluated with a deadline (see [`eval`]).

pub mod eval;
pub mod format;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use statree_core::{Metric, QueryResponse, Result, StatreeError};
use std::sync::Arc;

use crate::app_state::AppState;
use crate::obs::QueryKind;

#[derive(Debug, Default, Deserialize)]
pub struct FormatParam {
    #[serde(default)]
    pub format: Option<String>,
}

pub async fn all(
    State(state): State<AppState>,
    Query(p): Query<FormatParam>,
    headers: HeaderMap,
) -> Response {
    let selected = state.engine().select_all();
    answer(&state, QueryKind::All, "", selected, &p, &headers).await
}

pub async fn one(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(p): Query<FormatParam>,
    headers: HeaderMap,
) -> Response {
    let selected = state.engine().select_one(&name).map(|m| vec![m]);
    answer(&state, QueryKind::One, &name, selected, &p, &headers).await
}

pub async fn group(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
    Query(p): Query<FormatParam>,
    headers: HeaderMap,
) -> Response {
    let selected = state.engine().select_group(&prefix);
    answer(&state, QueryKind::Group, &prefix, selected, &p, &headers).await
}

pub async fn group_missing(
    State(state): State<AppState>,
    Query(p): Query<FormatParam>,
    headers: HeaderMap,
) -> Response {
    answer(&state, QueryKind::Group, "", Err(StatreeError::NoGroupPrefix), &p, &headers).await
}

/// Unmatched routes. A group path with an empty prefix (trailing slash)
/// still answers with a `no_group` envelope.
pub async fn fallback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Query(p): Query<FormatParam>,
    headers: HeaderMap,
) -> Response {
    if method == Method::GET && uri.path().trim_end_matches('/') == "/v1/metrics/group" {
        return group_missing(State(state), Query(p), headers).await;
    }
    (StatusCode::NOT_FOUND, "not found").into_response()
}

async fn answer(
    state: &AppState,
    kind: QueryKind,
    target: &str,
    selected: Result<Vec<Arc<Metric>>>,
    p: &FormatParam,
    headers: &HeaderMap,
) -> Response {
    state.record(kind);

    let resp = match selected {
        Ok(metrics) => state.evaluator().evaluate(metrics, state.callback_timeout()).await,
        Err(e) => QueryResponse::error(&e),
    };
    tracing::debug!(
        kind = kind.as_str(),
        target = %target,
        status = resp.status.as_str(),
        "metrics query"
    );

    let fmt = format::negotiate(p.format.as_deref(), headers, state.default_format());
    format::render(&resp, fmt)
}
