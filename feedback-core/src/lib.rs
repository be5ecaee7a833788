//! Core library for Vega Feedback.
//!
//! This crate provides the feedback models and the Google Sheets storage
//! adapter, independent of any transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use feedback_core::{FeedbackStore, FeedbackSubmission, SheetsClient, SheetsConfig};
//!
//! # async fn run() -> Result<(), feedback_core::SheetsError> {
//! let client = SheetsClient::connect(SheetsConfig::from_env()?).await?;
//!
//! let submission: FeedbackSubmission =
//!     serde_json::from_str(r#"{"helpfulness":"excellent"}"#).unwrap();
//! client.append_feedback(&submission).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod models;
pub mod sheets;
pub mod store;

// Re-export commonly used types at crate root
pub use error::SheetsError;
pub use models::*;
pub use sheets::{SheetsClient, SheetsConfig};
pub use store::{FeedbackStore, MemoryStore};
