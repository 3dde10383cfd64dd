//! Output format negotiation and status mapping.

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use statree_core::{QueryResponse, QueryStatus};

use crate::config::OutputFormat;

/// `?format=` wins, then the `Accept` header, then the configured default.
pub fn negotiate(param: Option<&str>, headers: &HeaderMap, default: OutputFormat) -> OutputFormat {
    if let Some(f) = param.and_then(OutputFormat::from_param) {
        return f;
    }
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    for media in accept.split(',').map(|m| m.split(';').next().unwrap_or("").trim()) {
        match media {
            "application/json" => return OutputFormat::Json,
            "application/yaml" | "application/x-yaml" | "text/yaml" => return OutputFormat::Yaml,
            _ => {}
        }
    }
    default
}

pub fn status_code(status: QueryStatus) -> StatusCode {
    match status {
        QueryStatus::Ok => StatusCode::OK,
        QueryStatus::NotFound | QueryStatus::NoMetrics => StatusCode::NOT_FOUND,
        QueryStatus::NoGroup | QueryStatus::BadRequest => StatusCode::BAD_REQUEST,
        QueryStatus::CollectorFail => StatusCode::SERVICE_UNAVAILABLE,
        QueryStatus::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn render(resp: &QueryResponse, fmt: OutputFormat) -> Response {
    let body = match fmt {
        OutputFormat::Json => serde_json::to_string(resp).map_err(|e| e.to_string()),
        OutputFormat::Yaml => serde_yaml::to_string(resp).map_err(|e| e.to_string()),
    };
    match body {
        Ok(body) => (
            status_code(resp.status),
            [(header::CONTENT_TYPE, fmt.content_type())],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "response serialization failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "serialization failed").into_response()
        }
    }
}
