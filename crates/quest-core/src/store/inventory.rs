//! ============================================================================
//! Inventory Store - owned items, sold one unit at a time
//! ============================================================================
//! A confirmed sale decrements the entry's amount by exactly one, removing
//! the entry when the last unit goes. The user is then reloaded for the new
//! balance.
//! ============================================================================

use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use super::{fetch_items, read_lock, write_lock, SessionStore};
use crate::api::Backend;
use crate::types::{OwnedItem, QuestError, Result};

pub struct InventoryStore {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    owned: RwLock<Vec<OwnedItem>>,
    last_error: RwLock<Option<QuestError>>,
}

impl InventoryStore {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>) -> Self {
        Self {
            backend,
            session,
            owned: RwLock::new(Vec::new()),
            last_error: RwLock::new(None),
        }
    }

    pub fn items(&self) -> Vec<OwnedItem> {
        read_lock(&self.owned).clone()
    }

    pub fn find(&self, item_id: i64) -> Option<OwnedItem> {
        read_lock(&self.owned)
            .iter()
            .find(|o| o.entry.item_id == item_id)
            .cloned()
    }

    /// Total units across all entries
    pub fn total_units(&self) -> u64 {
        read_lock(&self.owned).iter().map(|o| o.entry.amount as u64).sum()
    }

    pub fn last_error(&self) -> Option<QuestError> {
        read_lock(&self.last_error).clone()
    }

    pub async fn load(&self) -> Result<usize> {
        let user = self.session.require_user().map_err(|e| self.record(e))?;
        let entries = self
            .backend
            .list_inventory(user.id)
            .await
            .map_err(|e| self.record(e))?;
        let items = fetch_items(self.backend.as_ref(), entries.iter().map(|e| e.item_id)).await;

        let owned: Vec<OwnedItem> = entries
            .into_iter()
            .filter(|entry| entry.amount > 0)
            .filter_map(|entry| match items.get(&entry.item_id) {
                Some(item) => Some(OwnedItem {
                    item: item.clone(),
                    entry,
                }),
                None => {
                    warn!("Inventory entry {} dropped: item {} unavailable", entry.id, entry.item_id);
                    None
                }
            })
            .collect();

        let count = owned.len();
        *write_lock(&self.owned) = owned;
        *write_lock(&self.last_error) = None;
        debug!("Loaded {} inventory entries for user {}", count, user.id);
        Ok(count)
    }

    pub fn clear(&self) {
        write_lock(&self.owned).clear();
        *write_lock(&self.last_error) = None;
    }

    /// Sell one unit of an owned item. Returns the units left.
    pub async fn sell(&self, item_id: i64) -> Result<u32> {
        let user = self.session.require_user().map_err(|e| self.record(e))?;
        let owned = self
            .find(item_id)
            .ok_or_else(|| self.record(QuestError::InventoryEntryNotFound(item_id)))?;

        self.backend
            .sell_item(user.id, item_id)
            .await
            .map_err(|e| self.record(e))?;

        let remaining = {
            let mut entries = write_lock(&self.owned);
            match entries.iter().position(|o| o.entry.item_id == item_id) {
                Some(pos) if entries[pos].entry.amount > 1 => {
                    entries[pos].entry.amount -= 1;
                    entries[pos].entry.amount
                }
                Some(pos) => {
                    entries.remove(pos);
                    0
                }
                None => 0,
            }
        };
        *write_lock(&self.last_error) = None;
        info!("User {} sold one {} ({} left)", user.id, owned.item.name, remaining);

        if let Err(e) = self.session.reload_user().await {
            warn!("Balance refresh after sale failed: {}", e);
        }
        Ok(remaining)
    }

    fn record(&self, error: QuestError) -> QuestError {
        *write_lock(&self.last_error) = Some(error.clone());
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{logged_in_session, sample_item, sample_user, FakeBackend};
    use crate::types::InventoryEntry;

    fn entry(id: i64, item_id: i64, amount: u32) -> InventoryEntry {
        InventoryEntry {
            id,
            item_id,
            amount,
            acquire_date: Some("2026-09-01T08:00:00Z".into()),
        }
    }

    async fn inventory_with(
        entries: Vec<InventoryEntry>,
    ) -> (tempfile::TempDir, Arc<FakeBackend>, Arc<SessionStore>, InventoryStore) {
        let backend = Arc::new(FakeBackend::with_user(sample_user(1)));
        backend.seed_items(vec![sample_item(10, "Potion"), sample_item(11, "Scroll")]);
        backend.seed_inventory(1, entries);
        let (dir, session) = logged_in_session(backend.clone()).await;
        let store = InventoryStore::new(backend.clone(), session.clone());
        store.load().await.unwrap();
        (dir, backend, session, store)
    }

    #[tokio::test]
    async fn test_sell_last_unit_removes_entry() {
        let (_dir, _backend, _session, store) = inventory_with(vec![entry(1, 10, 1), entry(2, 11, 2)]).await;

        assert_eq!(store.sell(10).await.unwrap(), 0);
        assert!(store.find(10).is_none());
        assert_eq!(store.items().len(), 1);
    }

    #[tokio::test]
    async fn test_sell_decrements_by_one() {
        let (_dir, _backend, session, store) = inventory_with(vec![entry(1, 10, 3)]).await;

        assert_eq!(store.sell(10).await.unwrap(), 2);
        let owned = store.find(10).unwrap();
        assert_eq!(owned.entry.amount, 2);
        assert_eq!(owned.entry.id, 1);
        assert_eq!(store.total_units(), 2);
        // Sale proceeds are reflected after the user reload
        assert_eq!(session.current_user().map(|u| u.currency), Some(110));
    }

    #[tokio::test]
    async fn test_sell_failure_keeps_amount() {
        let (_dir, backend, _session, store) = inventory_with(vec![entry(1, 10, 1)]).await;

        backend.fail_next(500, "market closed");
        let err = store.sell(10).await.unwrap_err();
        assert!(err.to_string().contains("500"));
        assert_eq!(store.find(10).map(|o| o.entry.amount), Some(1));
        assert_eq!(store.last_error(), Some(err));
    }

    #[tokio::test]
    async fn test_sell_unknown_item_is_local_error() {
        let (_dir, backend, _session, store) = inventory_with(vec![entry(1, 10, 1)]).await;
        let calls = backend.call_count();

        assert_eq!(
            store.sell(42).await.unwrap_err(),
            QuestError::InventoryEntryNotFound(42)
        );
        assert_eq!(backend.call_count(), calls);
    }

    #[tokio::test]
    async fn test_load_skips_empty_entries() {
        let (_dir, _backend, _session, store) = inventory_with(vec![entry(1, 10, 0), entry(2, 11, 4)]).await;
        assert_eq!(store.items().len(), 1);
        assert_eq!(store.total_units(), 4);
    }
}
