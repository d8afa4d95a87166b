//! ============================================================================
//! QUEST-CORE: TaskQuest client
//! ============================================================================
//! Headless client for the TaskQuest gamified task backend:
//! - REST client for users, tasks, shop, items, inventory, achievements
//! - Session store with durable session id (redb)
//! - Task store with optimistic status toggle and full rollback
//! - Shop/inventory/achievement stores and explicit UI state
//! ============================================================================

pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod store;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for convenience
pub use api::{ApiClient, Backend};
pub use app::QuestApp;
pub use config::ClientConfig;
pub use db::SessionDb;
pub use store::{
    AchievementScope, AchievementStore, InventoryStore, Modal, SessionState, SessionStore,
    ShopStore, TaskEditBuffer, TaskStore, UiState,
};
pub use types::*;
