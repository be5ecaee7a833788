use url::Url;

use crate::error::SheetsError;

pub const DEFAULT_SHEET_NAME: &str = "Vega AI Feedback";
pub const DEFAULT_API_BASE_URL: &str = "https://sheets.googleapis.com/v4";

pub const SPREADSHEET_ID_VAR: &str = "GOOGLE_SPREADSHEET_ID";
pub const SHEET_NAME_VAR: &str = "GOOGLE_SHEET_NAME";
pub const SERVICE_ACCOUNT_VAR: &str = "GCP_SERVICE_ACCOUNT_EMAIL";
pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";
pub const API_BASE_URL_VAR: &str = "GOOGLE_SHEETS_API_URL";

/// Where feedback rows go and how to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Service account to impersonate when minting tokens.
    pub impersonate_service_account: Option<String>,
    /// Pre-issued OAuth token; skips the metadata server entirely.
    pub access_token: Option<String>,
    pub api_base_url: String,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            impersonate_service_account: None,
            access_token: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, SheetsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SheetsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let spreadsheet_id =
            get(SPREADSHEET_ID_VAR).ok_or(SheetsError::MissingConfig(SPREADSHEET_ID_VAR))?;

        let mut config = Self::new(spreadsheet_id);
        if let Some(sheet_name) = get(SHEET_NAME_VAR) {
            config.sheet_name = sheet_name;
        }
        config.impersonate_service_account = get(SERVICE_ACCOUNT_VAR);
        config.access_token = get(ACCESS_TOKEN_VAR);
        if let Some(api_base_url) = get(API_BASE_URL_VAR) {
            config.api_base_url = api_base_url;
        }

        Ok(config)
    }

    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = sheet_name.into();
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub(crate) fn parsed_base_url(&self) -> Result<Url, SheetsError> {
        Url::parse(&self.api_base_url).map_err(|source| SheetsError::InvalidBaseUrl {
            url: self.api_base_url.clone(),
            source,
        })
    }

    /// Header range, quoted so sheet names with spaces resolve.
    pub fn header_range(&self) -> String {
        format!("'{}'!A1:H1", self.sheet_name)
    }

    pub fn data_range(&self) -> String {
        format!("'{}'!A:H", self.sheet_name)
    }
}
