//! URL-encoded form decoding for feedback submissions.
//!
//! Body fields are only read for `application/x-www-form-urlencoded`
//! requests. Query-string fields are merged after them, so a body value wins
//! when a field appears in both.

use feedback_core::{FeedbackSubmission, DEFAULT_SETUP_DIFFICULTY};
use percent_encoding::percent_decode;
use thiserror::Error;
use url::form_urlencoded;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Separator used when a multi-valued field is flattened into one cell.
pub const MULTI_VALUE_SEPARATOR: &str = ", ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("invalid percent escape at byte {0}")]
    InvalidEscape(usize),

    #[error("invalid semicolon separator")]
    Semicolon,

    #[error("form data is not valid UTF-8")]
    InvalidUtf8,
}

/// Decoded form fields in submission order.
#[derive(Debug, Default)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl FormFields {
    pub fn parse(content_type: &str, body: &[u8], query: Option<&str>) -> Result<Self, FormError> {
        let mut fields = Self::default();
        if is_urlencoded(content_type) {
            fields.extend(body)?;
        }
        if let Some(query) = query {
            fields.extend(query.as_bytes())?;
        }
        Ok(fields)
    }

    fn extend(&mut self, raw: &[u8]) -> Result<(), FormError> {
        validate(raw)?;
        self.pairs.extend(
            form_urlencoded::parse(raw).map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
        Ok(())
    }

    /// First value for `key`, or the empty string.
    pub fn first(&self, key: &str) -> &str {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    pub fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_submission(&self) -> FeedbackSubmission {
        let setup_difficulty = self
            .first("setupDifficulty")
            .parse()
            .unwrap_or(DEFAULT_SETUP_DIFFICULTY);

        FeedbackSubmission {
            helpfulness: self.first("helpfulness").to_string(),
            setup_difficulty,
            docs_quality: self.first("docsQuality").to_string(),
            setup_issues: self
                .all("setupIssues")
                .collect::<Vec<_>>()
                .join(MULTI_VALUE_SEPARATOR),
            additional_feedback: self.first("additionalFeedback").to_string(),
            email: self.first("email").to_string(),
            source: self.first("source").to_string(),
        }
    }
}

/// Decode a form-encoded feedback submission.
pub fn parse_form(
    content_type: &str,
    body: &[u8],
    query: Option<&str>,
) -> Result<FeedbackSubmission, FormError> {
    Ok(FormFields::parse(content_type, body, query)?.to_submission())
}

fn is_urlencoded(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

fn validate(raw: &[u8]) -> Result<(), FormError> {
    if raw.split(|b| *b == b'&').any(|segment| segment.contains(&b';')) {
        return Err(FormError::Semicolon);
    }

    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let escape = raw.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return Err(FormError::InvalidEscape(i));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    // Separators are ASCII, so decoding the whole input catches any field
    // whose bytes are not UTF-8.
    percent_decode(raw)
        .decode_utf8()
        .map_err(|_| FormError::InvalidUtf8)?;
    Ok(())
}
