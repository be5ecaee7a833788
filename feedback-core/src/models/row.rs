use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use super::feedback::FeedbackSubmission;

/// Column headers written to row 1 of the feedback sheet (columns A-H).
pub const HEADER_ROW: [&str; 8] = [
    "Timestamp",
    "Helpfulness",
    "Setup Difficulty",
    "Docs Quality",
    "Setup Issues",
    "Additional Feedback",
    "Email",
    "Source",
];

/// One sheet row: the append timestamp followed by the submission fields,
/// in `HEADER_ROW` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRow {
    pub timestamp: DateTime<Utc>,
    pub submission: FeedbackSubmission,
}

impl StorageRow {
    pub fn new(submission: FeedbackSubmission, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            submission,
        }
    }

    /// Stamp a submission with the current time.
    pub fn now(submission: FeedbackSubmission) -> Self {
        Self::new(submission, Utc::now())
    }

    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn to_values(&self) -> Vec<Value> {
        let s = &self.submission;
        vec![
            Value::from(self.timestamp_string()),
            Value::from(s.helpfulness.as_str()),
            Value::from(s.setup_difficulty),
            Value::from(s.docs_quality.as_str()),
            Value::from(s.setup_issues.as_str()),
            Value::from(s.additional_feedback.as_str()),
            Value::from(s.email.as_str()),
            Value::from(s.source.as_str()),
        ]
    }
}

pub fn header_values() -> Vec<Value> {
    HEADER_ROW.iter().map(|h| Value::from(*h)).collect()
}
