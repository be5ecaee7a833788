//! Storage capability used by the HTTP layer.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SheetsError;
use crate::models::{FeedbackSubmission, StorageRow};

/// Somewhere feedback rows can be appended.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn append_feedback(&self, feedback: &FeedbackSubmission) -> Result<(), SheetsError>;
}

/// In-memory store, used for local runs without a spreadsheet and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StorageRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the rows appended so far, oldest first.
    pub fn rows(&self) -> Vec<StorageRow> {
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn append_feedback(&self, feedback: &FeedbackSubmission) -> Result<(), SheetsError> {
        let row = StorageRow::now(feedback.clone());
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(row);
        tracing::debug!("Stored feedback in memory from source: {}", feedback.source);
        Ok(())
    }
}
