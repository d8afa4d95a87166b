//! ============================================================================
//! QuestApp - wires the stores together
//! ============================================================================
//! One backend, one session database, one set of stores sharing them. UIs
//! (the CLI included) hold a `QuestApp` instead of reaching for globals.
//! ============================================================================

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{ApiClient, Backend};
use crate::config::ClientConfig;
use crate::db::{SessionDb, StoredSettings};
use crate::store::{AchievementStore, InventoryStore, SessionStore, ShopStore, TaskStore, UiState};
use crate::types::Result;

pub struct QuestApp {
    pub db: Arc<SessionDb>,
    pub session: Arc<SessionStore>,
    pub tasks: Arc<TaskStore>,
    pub shop: Arc<ShopStore>,
    pub inventory: Arc<InventoryStore>,
    pub achievements: Arc<AchievementStore>,
    pub ui: Arc<UiState>,
}

impl QuestApp {
    /// Open the session database and connect to the configured backend.
    /// A persisted session issued by a different backend is discarded.
    pub fn open(config: &ClientConfig) -> Result<Self> {
        let db = Arc::new(SessionDb::open(config.resolve_db_path()?)?);

        let settings = db.settings()?;
        if settings.api_base_url.as_deref() != Some(config.api_base_url.as_str()) {
            if settings.api_base_url.is_some() && db.clear_session()? {
                warn!("Backend changed to {}, discarding old session", config.api_base_url);
            }
            db.store_settings(&StoredSettings {
                api_base_url: Some(config.api_base_url.clone()),
            })?;
        }

        info!("Using TaskQuest backend at {}", config.api_base_url);
        let backend: Arc<dyn Backend> = Arc::new(ApiClient::from_config(config));
        Ok(Self::with_backend(backend, db))
    }

    pub fn with_backend(backend: Arc<dyn Backend>, db: Arc<SessionDb>) -> Self {
        let ui = Arc::new(UiState::new());
        let session = Arc::new(SessionStore::new(backend.clone(), db.clone()));
        Self {
            tasks: Arc::new(TaskStore::new(backend.clone(), session.clone(), ui.clone())),
            shop: Arc::new(ShopStore::new(backend.clone(), session.clone())),
            inventory: Arc::new(InventoryStore::new(backend.clone(), session.clone())),
            achievements: Arc::new(AchievementStore::new(backend, session.clone())),
            db,
            session,
            ui,
        }
    }

    /// Log out and drop the user's cached data
    pub fn logout(&self) {
        self.session.logout();
        self.tasks.clear();
        self.shop.clear();
        self.inventory.clear();
        self.achievements.clear();
        self.ui.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AchievementScope, Modal};
    use crate::testing::{sample_item, sample_task, sample_user, FakeBackend, PASSWORD};
    use crate::types::{Achievement, InventoryEntry, ShopListing};

    #[test]
    fn test_open_discards_session_from_other_backend() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.redb");

        let first = ClientConfig::default()
            .with_api_url("http://one.local")
            .with_db_path(&path);
        {
            let app = QuestApp::open(&first).unwrap();
            app.db.save_session(5).unwrap();
        }

        // Same backend: session kept
        let app = QuestApp::open(&first).unwrap();
        assert_eq!(app.db.session_user_id().unwrap(), Some(5));
        drop(app);

        let second = first.clone().with_api_url("http://two.local");
        let app = QuestApp::open(&second).unwrap();
        assert_eq!(app.db.session_user_id().unwrap(), None);
        assert_eq!(
            app.db.settings().unwrap().api_base_url.as_deref(),
            Some("http://two.local")
        );
    }

    #[tokio::test]
    async fn test_logout_clears_cached_user_data() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(SessionDb::open(dir.path().join("s.redb")).unwrap());
        let backend = Arc::new(FakeBackend::with_user(sample_user(1)));
        backend.seed_tasks(vec![sample_task(1, "Stretch")]);
        backend.seed_items(vec![sample_item(10, "Potion")]);
        backend.seed_listings(vec![ShopListing {
            id: 1,
            item_id: 10,
            cost: 20,
            availability: 3,
        }]);
        backend.seed_inventory(
            1,
            vec![InventoryEntry {
                id: 1,
                item_id: 10,
                amount: 2,
                acquire_date: None,
            }],
        );
        backend.seed_achievements(
            vec![],
            1,
            vec![Achievement {
                id: 1,
                name: "First task".into(),
                description: String::new(),
                icon_url: None,
                is_achieved: Some(true),
                required_xp: None,
                kind: None,
            }],
        );
        let app = QuestApp::with_backend(backend, db);

        app.session.login("user1@example.com", PASSWORD).await.unwrap();
        app.tasks.load().await.unwrap();
        app.shop.load().await.unwrap();
        app.inventory.load().await.unwrap();
        app.achievements.load(AchievementScope::ForCurrentUser).await.unwrap();
        app.ui.open(Modal::EditTask(1));
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.inventory.items().len(), 1);

        app.logout();
        assert!(!app.session.is_authenticated());
        assert!(app.tasks.is_empty());
        assert!(app.shop.offers().is_empty());
        assert!(app.inventory.items().is_empty());
        assert_eq!(app.inventory.total_units(), 0);
        assert!(app.achievements.achievements().is_empty());
        assert_eq!(app.ui.modal(), Modal::None);
    }
}
