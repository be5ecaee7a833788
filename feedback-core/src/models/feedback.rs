use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_SETUP_DIFFICULTY: i64 = 5;
pub const DEFAULT_SOURCE: &str = "landing-page";
pub const THANK_YOU_MESSAGE: &str =
    "Thank you for your feedback! Your insights will help us improve Vega AI for everyone.";

/// A survey submission from the landing page feedback form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmission {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub helpfulness: String,
    #[serde(
        default = "default_setup_difficulty",
        deserialize_with = "null_as_default_difficulty"
    )]
    pub setup_difficulty: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub docs_quality: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub setup_issues: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub additional_feedback: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub source: String,
}

impl Default for FeedbackSubmission {
    fn default() -> Self {
        Self {
            helpfulness: String::new(),
            setup_difficulty: DEFAULT_SETUP_DIFFICULTY,
            docs_quality: String::new(),
            setup_issues: String::new(),
            additional_feedback: String::new(),
            email: String::new(),
            source: String::new(),
        }
    }
}

impl FeedbackSubmission {
    /// Fill in `source` when the client left it blank.
    pub fn with_default_source(mut self) -> Self {
        if self.source.is_empty() {
            self.source = DEFAULT_SOURCE.to_string();
        }
        self
    }

    pub fn has_helpfulness(&self) -> bool {
        !self.helpfulness.is_empty()
    }
}

/// Body returned to the caller once a submission passes validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub message: String,
}

impl FeedbackResponse {
    pub fn thank_you() -> Self {
        Self {
            success: true,
            message: THANK_YOU_MESSAGE.to_string(),
        }
    }
}

fn default_setup_difficulty() -> i64 {
    DEFAULT_SETUP_DIFFICULTY
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_difficulty<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or(DEFAULT_SETUP_DIFFICULTY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camel_case_fields() {
        let submission: FeedbackSubmission = serde_json::from_str(
            r#"{
                "helpfulness": "excellent",
                "setupDifficulty": 3,
                "docsQuality": "good",
                "setupIssues": "none",
                "additionalFeedback": "Great tool!",
                "email": "test@example.com",
                "source": "test"
            }"#,
        )
        .unwrap();

        assert_eq!(submission.helpfulness, "excellent");
        assert_eq!(submission.setup_difficulty, 3);
        assert_eq!(submission.docs_quality, "good");
        assert_eq!(submission.setup_issues, "none");
        assert_eq!(submission.additional_feedback, "Great tool!");
        assert_eq!(submission.email, "test@example.com");
        assert_eq!(submission.source, "test");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let submission: FeedbackSubmission =
            serde_json::from_str(r#"{"helpfulness":"good"}"#).unwrap();

        assert_eq!(submission.setup_difficulty, DEFAULT_SETUP_DIFFICULTY);
        assert!(submission.docs_quality.is_empty());
        assert!(submission.source.is_empty());
    }

    #[test]
    fn null_fields_are_treated_as_empty() {
        let submission: FeedbackSubmission = serde_json::from_str(
            r#"{"helpfulness":"good","email":null,"setupDifficulty":null}"#,
        )
        .unwrap();

        assert!(submission.email.is_empty());
        assert_eq!(submission.setup_difficulty, DEFAULT_SETUP_DIFFICULTY);
    }

    #[test]
    fn ignores_unknown_fields() {
        let submission: FeedbackSubmission =
            serde_json::from_str(r#"{"helpfulness":"good","utm":"newsletter"}"#).unwrap();
        assert_eq!(submission.helpfulness, "good");
    }

    #[test]
    fn rejects_non_integer_difficulty() {
        let result = serde_json::from_str::<FeedbackSubmission>(
            r#"{"helpfulness":"good","setupDifficulty":"hard"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn default_source_only_fills_blank() {
        let blank = FeedbackSubmission {
            helpfulness: "good".into(),
            ..Default::default()
        };
        assert_eq!(blank.with_default_source().source, DEFAULT_SOURCE);

        let tagged = FeedbackSubmission {
            helpfulness: "good".into(),
            source: "newsletter".into(),
            ..Default::default()
        };
        assert_eq!(tagged.with_default_source().source, "newsletter");
    }

    #[test]
    fn thank_you_response_serializes_as_expected() {
        let json = serde_json::to_value(FeedbackResponse::thank_you()).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], THANK_YOU_MESSAGE);
    }
}
