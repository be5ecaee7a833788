use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::form::FormError;

/// Client-facing failures. Each renders as a plain-text body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unknown action")]
    UnknownAction,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Invalid form data")]
    InvalidForm(#[from] FormError),

    #[error("Helpfulness is required")]
    MissingHelpfulness,

    #[error("Internal server error")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnknownAction
            | Self::InvalidJson(_)
            | Self::InvalidForm(_)
            | Self::MissingHelpfulness => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}
