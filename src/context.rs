use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Process wide busy indicator. A single flag: the last writer wins, there
/// is no counting of overlapping operations.
#[derive(Debug, Clone, Default)]
pub struct LoadingStore {
    loading: Arc<AtomicBool>,
}

impl LoadingStore {
    pub fn set_loading(&self, loading: bool) {
        self.loading.store(loading, Ordering::SeqCst);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}

/// Last user facing error message, shared by every store.
#[derive(Debug, Clone, Default)]
pub struct ErrorStore {
    error: Arc<Mutex<Option<String>>>,
}

impl ErrorStore {
    pub fn set_error(&self, message: impl Into<String>) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    pub fn clear_error(&self) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn error(&self) -> Option<String> {
        self.error.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Handles injected into each store. Clones share the same flags.
#[derive(Debug, Clone, Default)]
pub struct StoreContext {
    pub loading: LoadingStore,
    pub errors: ErrorStore,
}

impl StoreContext {
    pub fn new() -> Self {
        Self::default()
    }
}
