//! The `feedback` action.

use axum::{
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};
use feedback_core::{FeedbackResponse, FeedbackSubmission, SheetsError};

use super::{error::ApiError, form, AppState};

const JSON_CONTENT_TYPE: &str = "application/json";

pub(super) async fn handle_feedback(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    match process(state, method, uri, headers, body).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                ApiError::InvalidJson(source) => {
                    tracing::error!("Failed to decode JSON request: {}", source)
                }
                ApiError::InvalidForm(source) => {
                    tracing::error!("Failed to parse form data: {}", source)
                }
                ApiError::Encode(source) => {
                    tracing::error!("Failed to encode response: {}", source)
                }
                ApiError::MissingHelpfulness => {
                    tracing::error!("Missing required field 'helpfulness' in feedback request")
                }
                ApiError::MethodNotAllowed | ApiError::UnknownAction => {}
            }
            e.into_response()
        }
    }
}

async fn process(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, ApiError> {
    if *method != Method::POST {
        tracing::error!("Invalid method {} for feedback endpoint", method);
        return Err(ApiError::MethodNotAllowed);
    }

    let store = state.storage().get().await;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let submission = if content_type.contains(JSON_CONTENT_TYPE) {
        decode_json(body)?
    } else {
        form::parse_form(content_type, body, uri.query())?
    };

    if !submission.has_helpfulness() {
        return Err(ApiError::MissingHelpfulness);
    }
    let submission = submission.with_default_source();

    tracing::info!("Processing feedback from source: {}", submission.source);

    match store {
        Some(store) => {
            let timeout = state.append_timeout;
            let result = tokio::time::timeout(timeout, store.append_feedback(&submission))
                .await
                .unwrap_or_else(|_| {
                    Err(SheetsError::Timeout {
                        operation: "append feedback to sheet",
                        timeout,
                    })
                });
            if let Err(e) = result {
                tracing::error!("Failed to store feedback in Google Sheets: {}", e);
            }
        }
        None => {
            tracing::warn!("Google Sheets service not available, feedback not stored in sheets")
        }
    }

    tracing::info!("Feedback processed successfully");

    let body = serde_json::to_vec(&FeedbackResponse::thank_you()).map_err(ApiError::Encode)?;
    Ok(([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response())
}

/// Decodes the first JSON value in the body. Anything after it is ignored.
fn decode_json(body: &[u8]) -> Result<FeedbackSubmission, ApiError> {
    let first = serde_json::Deserializer::from_slice(body)
        .into_iter::<FeedbackSubmission>()
        .next();
    match first {
        Some(submission) => submission.map_err(ApiError::InvalidJson),
        // Empty body: let the plain decoder report the EOF.
        None => serde_json::from_slice(body).map_err(ApiError::InvalidJson),
    }
}
