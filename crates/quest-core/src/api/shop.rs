//! ============================================================================
//! Shop & item endpoints
//! ============================================================================

use reqwest::Method;
use tracing::info;

use super::ApiClient;
use crate::types::{Item, Result, ShopListing};

impl ApiClient {
    /// `GET /shop`
    pub async fn list_shop(&self) -> Result<Vec<ShopListing>> {
        let request = self.request(Method::GET, "/shop");
        self.send_json(request, "list shop").await
    }

    /// `POST /shop/buy/{userId}/{listingId}`
    pub async fn buy_listing(&self, user_id: i64, listing_id: i64) -> Result<()> {
        info!("User {} buying listing {}", user_id, listing_id);
        let request = self.request(Method::POST, &format!("/shop/buy/{}/{}", user_id, listing_id));
        self.send_empty(request, "buy listing").await
    }

    /// `GET /items/{id}`
    pub async fn fetch_item(&self, item_id: i64) -> Result<Item> {
        let request = self.request(Method::GET, &format!("/items/{}", item_id));
        self.send_json(request, "fetch item").await
    }
}
