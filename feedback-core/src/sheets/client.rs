use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::{ParseError, Url};

use super::config::SheetsConfig;
use crate::auth::TokenProvider;
use crate::error::SheetsError;
use crate::models::{header_values, FeedbackSubmission, StorageRow};
use crate::store::FeedbackStore;

/// Upper bound on any single HTTP call made by the client.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    major_dimension: Option<String>,
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets v4 client bound to one spreadsheet tab.
pub struct SheetsClient {
    http: reqwest::Client,
    auth: TokenProvider,
    api_base: Url,
    spreadsheet_id: String,
    sheet_name: String,
    header_range: String,
    data_range: String,
}

impl SheetsClient {
    /// Build a client and make sure the header row exists.
    pub async fn connect(config: SheetsConfig) -> Result<Self, SheetsError> {
        if config.spreadsheet_id.is_empty() {
            return Err(SheetsError::MissingConfig(super::config::SPREADSHEET_ID_VAR));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SheetsError::http("create sheets service"))?;

        let client = Self {
            auth: TokenProvider::new(http.clone(), &config),
            api_base: config.parsed_base_url()?,
            header_range: config.header_range(),
            data_range: config.data_range(),
            spreadsheet_id: config.spreadsheet_id,
            sheet_name: config.sheet_name,
            http,
        };

        client.ensure_headers().await?;

        tracing::info!(
            "Google Sheets service initialized successfully for spreadsheet: {}",
            client.spreadsheet_id
        );
        Ok(client)
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    fn values_url(&self, segment: &str) -> Result<Url, SheetsError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidBaseUrl {
                url: self.api_base.to_string(),
                source: ParseError::RelativeUrlWithCannotBeABaseBase,
            })?
            .pop_if_empty()
            .extend(["spreadsheets", self.spreadsheet_id.as_str(), "values", segment]);
        Ok(url)
    }

    async fn check(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, SheetsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SheetsError::Api {
            operation,
            status,
            body,
        })
    }

    /// Write the header row if row 1 is empty. Returns whether it wrote.
    pub async fn ensure_headers(&self) -> Result<bool, SheetsError> {
        const CHECK: &str = "check existing headers";
        const WRITE: &str = "add headers";

        let token = self.auth.token().await?;
        let response = self
            .http
            .get(self.values_url(&self.header_range)?)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(SheetsError::http(CHECK))?;
        let existing: ValueRange = Self::check(CHECK, response)
            .await?
            .json()
            .await
            .map_err(SheetsError::http(CHECK))?;

        let has_headers = existing.values.first().is_some_and(|row| !row.is_empty());
        if has_headers {
            return Ok(false);
        }

        let mut url = self.values_url(&self.header_range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = ValueRange {
            range: Some(self.header_range.clone()),
            major_dimension: Some("ROWS".to_string()),
            values: vec![header_values()],
        };
        let response = self
            .http
            .put(url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(SheetsError::http(WRITE))?;
        Self::check(WRITE, response).await?;

        tracing::info!("Added headers to Google Sheet: {}", self.sheet_name);
        Ok(true)
    }

    /// Append one row below the sheet's used range.
    pub async fn append_row(&self, row: &StorageRow) -> Result<(), SheetsError> {
        const APPEND: &str = "append feedback to sheet";

        let mut url = self.values_url(&format!("{}:append", self.data_range))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = ValueRange {
            values: vec![row.to_values()],
            ..Default::default()
        };

        let token = self.auth.token().await?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    SheetsError::Timeout {
                        operation: APPEND,
                        timeout: REQUEST_TIMEOUT,
                    }
                } else {
                    SheetsError::Http {
                        operation: APPEND,
                        source,
                    }
                }
            })?;
        Self::check(APPEND, response).await?;
        Ok(())
    }
}

#[async_trait]
impl FeedbackStore for SheetsClient {
    async fn append_feedback(&self, feedback: &FeedbackSubmission) -> Result<(), SheetsError> {
        self.append_row(&StorageRow::now(feedback.clone())).await?;
        tracing::info!(
            "Successfully appended feedback to Google Sheets from source: {}",
            feedback.source
        );
        Ok(())
    }
}
