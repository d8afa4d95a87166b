//! ============================================================================
//! API Module - REST access to the TaskQuest backend
//! ============================================================================
//! `ApiClient` issues the HTTP calls, one file per resource:
//! - users: profile fetch, auth, registration, profile update
//! - tasks: list/create/update/delete
//! - shop: listings, purchase, item details
//! - inventory: entries, sell one unit
//! - achievements: global and per-user lists
//!
//! Stores depend on the `Backend` trait rather than on `ApiClient`
//! directly so they can be driven by an in-memory backend in tests.
//! ============================================================================

mod achievements;
mod client;
mod inventory;
mod shop;
mod tasks;
mod users;

#[cfg(test)]
pub(crate) use client::test_server;
pub use client::{describe_error, ApiClient};

use async_trait::async_trait;

use crate::types::{
    Achievement, InventoryEntry, Item, LoginRequest, ProfileUpdate, RegisterRequest, Result,
    ShopListing, Task, TaskDraft, User,
};

/// Backend operations the client stores rely on
#[async_trait]
pub trait Backend: Send + Sync {
    async fn fetch_user(&self, user_id: i64) -> Result<User>;
    async fn authenticate(&self, credentials: &LoginRequest) -> Result<User>;
    async fn register_user(&self, registration: &RegisterRequest) -> Result<User>;
    async fn update_user(&self, user_id: i64, changes: &ProfileUpdate) -> Result<User>;

    async fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>>;
    async fn create_task(&self, author_id: i64, executor_id: i64, draft: &TaskDraft) -> Result<Task>;
    async fn update_task(&self, user_id: i64, task: &Task) -> Result<Task>;
    async fn delete_task(&self, user_id: i64, task_id: i64) -> Result<()>;

    async fn list_shop(&self) -> Result<Vec<ShopListing>>;
    async fn buy_listing(&self, user_id: i64, listing_id: i64) -> Result<()>;
    async fn fetch_item(&self, item_id: i64) -> Result<Item>;

    async fn list_inventory(&self, user_id: i64) -> Result<Vec<InventoryEntry>>;
    async fn sell_item(&self, user_id: i64, item_id: i64) -> Result<()>;

    async fn list_achievements(&self) -> Result<Vec<Achievement>>;
    async fn list_user_achievements(&self, user_id: i64) -> Result<Vec<Achievement>>;
}

#[async_trait]
impl Backend for ApiClient {
    async fn fetch_user(&self, user_id: i64) -> Result<User> {
        ApiClient::fetch_user(self, user_id).await
    }

    async fn authenticate(&self, credentials: &LoginRequest) -> Result<User> {
        ApiClient::authenticate(self, credentials).await
    }

    async fn register_user(&self, registration: &RegisterRequest) -> Result<User> {
        ApiClient::register_user(self, registration).await
    }

    async fn update_user(&self, user_id: i64, changes: &ProfileUpdate) -> Result<User> {
        ApiClient::update_user(self, user_id, changes).await
    }

    async fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>> {
        ApiClient::list_tasks(self, user_id).await
    }

    async fn create_task(&self, author_id: i64, executor_id: i64, draft: &TaskDraft) -> Result<Task> {
        ApiClient::create_task(self, author_id, executor_id, draft).await
    }

    async fn update_task(&self, user_id: i64, task: &Task) -> Result<Task> {
        ApiClient::update_task(self, user_id, task).await
    }

    async fn delete_task(&self, user_id: i64, task_id: i64) -> Result<()> {
        ApiClient::delete_task(self, user_id, task_id).await
    }

    async fn list_shop(&self) -> Result<Vec<ShopListing>> {
        ApiClient::list_shop(self).await
    }

    async fn buy_listing(&self, user_id: i64, listing_id: i64) -> Result<()> {
        ApiClient::buy_listing(self, user_id, listing_id).await
    }

    async fn fetch_item(&self, item_id: i64) -> Result<Item> {
        ApiClient::fetch_item(self, item_id).await
    }

    async fn list_inventory(&self, user_id: i64) -> Result<Vec<InventoryEntry>> {
        ApiClient::list_inventory(self, user_id).await
    }

    async fn sell_item(&self, user_id: i64, item_id: i64) -> Result<()> {
        ApiClient::sell_item(self, user_id, item_id).await
    }

    async fn list_achievements(&self) -> Result<Vec<Achievement>> {
        ApiClient::list_achievements(self).await
    }

    async fn list_user_achievements(&self, user_id: i64) -> Result<Vec<Achievement>> {
        ApiClient::list_user_achievements(self, user_id).await
    }
}
