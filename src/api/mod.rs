//! Router: CORS headers, action extraction and dispatch.

mod error;
mod feedback;
pub mod form;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use percent_encoding::percent_decode_str;
use tower::ServiceBuilder;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use url::form_urlencoded;

use crate::storage::StorageLatch;

pub use error::ApiError;

pub const ACTION_FEEDBACK: &str = "feedback";
pub const ALLOWED_METHODS: &str = "POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type";

/// Bound on a single storage append.
pub const APPEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    storage: Arc<StorageLatch>,
    append_timeout: Duration,
}

impl AppState {
    pub fn new(storage: StorageLatch) -> Self {
        Self {
            storage: Arc::new(storage),
            append_timeout: APPEND_TIMEOUT,
        }
    }

    pub fn with_append_timeout(mut self, timeout: Duration) -> Self {
        self.append_timeout = timeout;
        self
    }

    pub fn storage(&self) -> &StorageLatch {
        &self.storage
    }
}

pub fn create_router(storage: StorageLatch) -> Router {
    create_router_with_state(AppState::new(storage))
}

/// Every path lands on one handler; the action decides what runs.
pub fn create_router_with_state(state: AppState) -> Router {
    let cors = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ));

    Router::new()
        .fallback(application)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn application(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    let action = extract_action(&uri);
    tracing::info!("Processing request with action: {}", action);

    match action.as_str() {
        ACTION_FEEDBACK => {
            feedback::handle_feedback(&state, &method, &uri, &headers, &body).await
        }
        _ => {
            tracing::error!("Unknown action requested: {}", action);
            ApiError::UnknownAction.into_response()
        }
    }
}

/// Action from `?action=`, falling back to the decoded path without its
/// leading slash. Empty when neither is present.
pub fn extract_action(uri: &Uri) -> String {
    let from_query = uri.query().and_then(|query| {
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "action")
            .map(|(_, value)| value.into_owned())
    });

    if let Some(action) = from_query.filter(|a| !a.is_empty()) {
        tracing::debug!("Found action in query: {}", action);
        return action;
    }

    let path = percent_decode_str(uri.path()).decode_utf8_lossy();
    let path = path.strip_prefix('/').unwrap_or(&path);
    if !path.is_empty() {
        tracing::debug!("Found action in path: {}", path);
        return path.to_string();
    }

    tracing::debug!("No action found");
    String::new()
}
