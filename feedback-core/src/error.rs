use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while configuring or talking to the spreadsheet backend.
#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("{0} environment variable is required")]
    MissingConfig(&'static str),

    #[error("invalid API base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to obtain access token: {0}")]
    Credentials(String),

    #[error("failed to {operation}: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to {operation}: {status}: {body}")]
    Api {
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to {operation}: timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

impl SheetsError {
    pub(crate) fn http(operation: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Http { operation, source }
    }
}
