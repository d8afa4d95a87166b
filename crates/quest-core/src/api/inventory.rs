//! ============================================================================
//! Inventory endpoints
//! ============================================================================

use reqwest::Method;
use tracing::info;

use super::ApiClient;
use crate::types::{InventoryEntry, Result};

impl ApiClient {
    /// `GET /inventory/user/{userId}`
    pub async fn list_inventory(&self, user_id: i64) -> Result<Vec<InventoryEntry>> {
        let request = self.request(Method::GET, &format!("/inventory/user/{}", user_id));
        self.send_json(request, "list inventory").await
    }

    /// `DELETE /inventory/sell/{userId}/{itemId}` - sells one unit
    pub async fn sell_item(&self, user_id: i64, item_id: i64) -> Result<()> {
        info!("User {} selling one of item {}", user_id, item_id);
        let request = self.request(Method::DELETE, &format!("/inventory/sell/{}/{}", user_id, item_id));
        self.send_empty(request, "sell item").await
    }
}
