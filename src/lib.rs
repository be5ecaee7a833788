//! HTTP entry point for landing page feedback.
//!
//! Requests are routed by an `action` token, validated, and forwarded to a
//! [`feedback_core::FeedbackStore`] (Google Sheets in production).

pub mod api;
pub mod storage;

pub use api::{create_router, AppState};
pub use storage::StorageLatch;
