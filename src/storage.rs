//! One-time construction of the feedback store.
//!
//! The store is built on first use and shared for the rest of the process.
//! A failed build is remembered too: the handler keeps serving and simply
//! skips storage.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use feedback_core::{FeedbackStore, SheetsClient, SheetsConfig};
use tokio::sync::OnceCell;

pub type SharedStore = Arc<dyn FeedbackStore>;

type InitFuture = Pin<Box<dyn Future<Output = Option<SharedStore>> + Send>>;
type InitFn = Box<dyn Fn() -> InitFuture + Send + Sync>;

pub struct StorageLatch {
    cell: OnceCell<Option<SharedStore>>,
    init: InitFn,
}

impl StorageLatch {
    /// Latch that runs `init` the first time storage is requested.
    pub fn new<F, Fut>(init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<SharedStore>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            init: Box::new(move || Box::pin(init())),
        }
    }

    /// Latch backed by Google Sheets, configured from the environment.
    pub fn from_env() -> Self {
        Self::new(connect_from_env)
    }

    /// Latch that is already initialized with `store`.
    pub fn ready(store: SharedStore) -> Self {
        Self::settled(Some(store))
    }

    /// Latch whose initialization already failed.
    pub fn disabled() -> Self {
        Self::settled(None)
    }

    fn settled(value: Option<SharedStore>) -> Self {
        Self {
            cell: OnceCell::new_with(Some(value)),
            init: Box::new(|| Box::pin(async { None })),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// The store, initializing it on first call. Concurrent first callers
    /// wait on a single initialization.
    pub async fn get(&self) -> Option<SharedStore> {
        self.cell.get_or_init(|| (self.init)()).await.clone()
    }
}

async fn connect_from_env() -> Option<SharedStore> {
    let config = match SheetsConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Google Sheets not configured: {}", e);
            return None;
        }
    };

    match SheetsClient::connect(config).await {
        Ok(client) => {
            tracing::info!("Google Sheets service initialized successfully");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("Google Sheets not configured: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedback_core::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_calls_initialize_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let latch = Arc::new(StorageLatch::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Some(Arc::new(MemoryStore::new()) as SharedStore)
            }
        }));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let latch = latch.clone();
                tokio::spawn(async move { latch.get().await.is_some() })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(latch.is_initialized());
    }

    #[tokio::test]
    async fn failed_initialization_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let latch = StorageLatch::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { None }
        });

        assert!(latch.get().await.is_none());
        assert!(latch.get().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn settled_latches_skip_initialization() {
        let ready = StorageLatch::ready(Arc::new(MemoryStore::new()));
        assert!(ready.is_initialized());
        assert!(ready.get().await.is_some());

        let disabled = StorageLatch::disabled();
        assert!(disabled.is_initialized());
        assert!(disabled.get().await.is_none());
    }
}
