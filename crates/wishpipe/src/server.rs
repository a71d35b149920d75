//! HTTP transport for the extraction pipeline.
//!
//! A thin adapter: query validation, the SSRF guard, the optional bearer
//! check, then one pipeline call. All extraction semantics live in
//! `wishpipe-core`; this module only maps errors to statuses and wire
//! messages.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use wishpipe_core::pipeline::{self, ExtractOptions};
use wishpipe_core::{guard, Error, ExtractionRequest, MetadataFetcher, PageFetcher, TokenValidator};

pub struct AppState {
    pub fetcher: Arc<dyn MetadataFetcher>,
    pub pages: Arc<dyn PageFetcher>,
    pub validator: Option<Arc<dyn TokenValidator>>,
    pub options: ExtractOptions,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/scrape", get(scrape).options(preflight))
        .with_state(state)
}

pub async fn serve(
    state: Arc<AppState>,
    listener: tokio::net::TcpListener,
) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

#[derive(Debug, Deserialize)]
struct ScrapeParams {
    url: Option<String>,
}

async fn preflight(headers: HeaderMap) -> Response {
    let mut resp = StatusCode::OK.into_response();
    apply_cors(&headers, &mut resp);
    resp
}

async fn scrape(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScrapeParams>,
    headers: HeaderMap,
) -> Response {
    let mut resp = scrape_inner(&state, params, &headers).await;
    apply_cors(&headers, &mut resp);
    resp
}

async fn scrape_inner(state: &AppState, params: ScrapeParams, headers: &HeaderMap) -> Response {
    let Some(url) = params
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
    else {
        return error_response(StatusCode::BAD_REQUEST, "missing url query parameter");
    };

    if !state.options.allow_unsafe_targets && !guard::is_safe_url(&url) {
        return error_response(StatusCode::FORBIDDEN, "url is not allowed");
    }

    if let Some(validator) = &state.validator {
        let Some(token) = bearer_token(headers) else {
            return error_response(StatusCode::UNAUTHORIZED, "missing bearer token");
        };
        if let Err(err) = validator.validate(token).await {
            tracing::debug!(error = %err, "bearer token rejected");
            return error_response(StatusCode::UNAUTHORIZED, "invalid bearer token");
        }
    }

    let req = ExtractionRequest { url };
    match pipeline::extract(&req, state.fetcher.as_ref(), state.pages.as_ref(), &state.options)
        .await
    {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => {
            let (status, message) = classify(&err);
            if status.is_server_error() {
                tracing::warn!(url = %req.url, error = %err, "extraction failed");
            }
            error_response(status, message)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Coarse classification for the wire. Raw upstream detail goes to the log,
/// never to the client.
fn classify(err: &Error) -> (StatusCode, &'static str) {
    match err {
        Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "missing url query parameter"),
        Error::ForbiddenTarget(_) => (StatusCode::FORBIDDEN, "url is not allowed"),
        Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "invalid bearer token"),
        Error::UpstreamBlocked => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "This site blocks automated access. Please enter details manually.",
        ),
        Error::UpstreamTimeout => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Request timed out. Site took too long to respond.",
        ),
        Error::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to scrape metadata"),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

// Permissive CORS on every response: echo the caller's origin (wildcard when
// absent) and allow credentials.
fn apply_cors(request_headers: &HeaderMap, resp: &mut Response) {
    let origin = request_headers
        .get(header::ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));
    let h = resp.headers_mut();
    h.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    h.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    h.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    h.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}
