//! ============================================================================
//! Store Module - Client-side state over the TaskQuest backend
//! ============================================================================
//! Each store is an explicit object built from its collaborators, so every
//! test (or UI) can hold an isolated instance:
//! - SessionStore: authenticated user, persisted session id
//! - TaskStore: the user's task list, optimistic status toggle with rollback
//! - ShopStore: listings joined with item details, purchases
//! - InventoryStore: owned items, selling one unit at a time
//! - AchievementStore: read-only achievement lists
//! - UiState: which modal is open, task edit buffers
//!
//! Store locks are only held between await points, never across a request.
//! ============================================================================

mod achievements;
mod inventory;
mod session;
mod shop;
mod tasks;
mod ui;

pub use achievements::{AchievementProgress, AchievementScope, AchievementStore};
pub use inventory::InventoryStore;
pub use session::{SessionState, SessionStore};
pub use shop::ShopStore;
pub use tasks::TaskStore;
pub use ui::{Modal, TaskEditBuffer, UiState};

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;

use crate::api::Backend;
use crate::types::Item;

// A panic while holding a store lock leaves plain data behind; keep serving it.
pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fetch each distinct item once. Items that fail to load are left out.
pub(crate) async fn fetch_items<I>(backend: &dyn Backend, item_ids: I) -> HashMap<i64, Item>
where
    I: IntoIterator<Item = i64>,
{
    let mut items = HashMap::new();
    let mut seen = HashSet::new();
    for item_id in item_ids {
        if !seen.insert(item_id) {
            continue;
        }
        match backend.fetch_item(item_id).await {
            Ok(item) => {
                items.insert(item_id, item);
            }
            Err(e) => warn!("Skipping item {}: {}", item_id, e),
        }
    }
    items
}
