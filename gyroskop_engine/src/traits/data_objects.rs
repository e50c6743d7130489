use crate::window_api::window_objects::ClosedWindow;

/// The outcome of one pass of the expiry scheduler.
#[derive(Debug, Clone, Default)]
pub struct ExpiryResult {
    pub closed: Vec<ClosedWindow>,
    /// Windows found overdue in the in-memory cache
    pub from_cache: usize,
    /// Windows that were missing from the cache but found overdue in the store
    pub from_store: usize,
}

impl ExpiryResult {
    pub fn total_count(&self) -> usize {
        self.closed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closed.is_empty()
    }
}

/// The outcome of loading open windows from the store at startup.
#[derive(Debug, Clone, Default)]
pub struct RestoreResult {
    /// Number of windows that are still open and were loaded into the cache
    pub loaded: usize,
    /// Windows whose deadline passed while the bot was offline. They were closed immediately.
    pub expired: Vec<ClosedWindow>,
}
