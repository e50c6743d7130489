use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};

use crate::db_types::{GroupId, OrderingWindow};

/// In-memory index of open windows per group, plus the per-group locks that serialise state transitions.
///
/// The cache only drives the expiry scan. Every validating read goes to the store.
#[derive(Default)]
pub(crate) struct OpenWindows {
    windows: RwLock<HashMap<GroupId, OrderingWindow>>,
    locks: Mutex<HashMap<GroupId, Arc<AsyncMutex<()>>>>,
}

impl OpenWindows {
    /// Waits for exclusive access to the group. Other groups are unaffected.
    pub async fn lock_group(&self, group: GroupId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(group).or_default())
        };
        lock.lock_owned().await
    }

    pub async fn insert(&self, window: OrderingWindow) {
        self.windows.write().await.insert(window.group_id, window);
    }

    /// Removes the group's entry, but only if it still refers to the given window.
    pub async fn evict(&self, group: GroupId, window_id: i64) -> bool {
        let mut windows = self.windows.write().await;
        match windows.get(&group) {
            Some(w) if w.id == window_id => windows.remove(&group).is_some(),
            _ => false,
        }
    }

    /// Keeps the cache in line with what the store says is open for the group.
    pub async fn sync(&self, group: GroupId, window: Option<&OrderingWindow>) {
        let mut windows = self.windows.write().await;
        match window {
            Some(w) => {
                windows.insert(group, w.clone());
            },
            None => {
                windows.remove(&group);
            },
        }
    }

    pub async fn overdue(&self, now: DateTime<Utc>) -> Vec<OrderingWindow> {
        self.windows.read().await.values().filter(|w| w.is_expired_at(now)).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.windows.read().await.len()
    }
}
