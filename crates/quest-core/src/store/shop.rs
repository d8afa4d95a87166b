//! ============================================================================
//! Shop Store - listings joined with item details, purchases
//! ============================================================================
//! Purchases are pessimistic. After a confirmed purchase the user record is
//! reloaded, since the backend owns the currency balance.
//! ============================================================================

use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use super::{fetch_items, read_lock, write_lock, SessionStore};
use crate::api::Backend;
use crate::types::{QuestError, Result, ShopOffer};

pub struct ShopStore {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
    offers: RwLock<Vec<ShopOffer>>,
    last_error: RwLock<Option<QuestError>>,
}

impl ShopStore {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>) -> Self {
        Self {
            backend,
            session,
            offers: RwLock::new(Vec::new()),
            last_error: RwLock::new(None),
        }
    }

    pub fn offers(&self) -> Vec<ShopOffer> {
        read_lock(&self.offers).clone()
    }

    pub fn offer(&self, listing_id: i64) -> Option<ShopOffer> {
        read_lock(&self.offers)
            .iter()
            .find(|o| o.listing.id == listing_id)
            .cloned()
    }

    pub fn last_error(&self) -> Option<QuestError> {
        read_lock(&self.last_error).clone()
    }

    /// Fetch listings and join each with its item. Listings whose item
    /// cannot be fetched are left out.
    pub async fn load(&self) -> Result<usize> {
        let listings = self.backend.list_shop().await.map_err(|e| self.record(e))?;
        let items = fetch_items(self.backend.as_ref(), listings.iter().map(|l| l.item_id)).await;

        let offers: Vec<ShopOffer> = listings
            .into_iter()
            .filter_map(|listing| match items.get(&listing.item_id) {
                Some(item) => Some(ShopOffer {
                    item: item.clone(),
                    listing,
                }),
                None => {
                    warn!("Listing {} dropped: item {} unavailable", listing.id, listing.item_id);
                    None
                }
            })
            .collect();

        let count = offers.len();
        *write_lock(&self.offers) = offers;
        *write_lock(&self.last_error) = None;
        debug!("Loaded {} shop offers", count);
        Ok(count)
    }

    /// Forget loaded offers (e.g. after logout)
    pub fn clear(&self) {
        write_lock(&self.offers).clear();
        *write_lock(&self.last_error) = None;
    }

    /// Buy one unit of a listing
    pub async fn buy(&self, listing_id: i64) -> Result<()> {
        let user = self.session.require_user().map_err(|e| self.record(e))?;
        let offer = self
            .offer(listing_id)
            .ok_or_else(|| self.record(QuestError::ListingNotFound(listing_id)))?;

        if !offer.in_stock() {
            return Err(self.record(QuestError::Validation(format!(
                "{} is out of stock",
                offer.item.name
            ))));
        }
        if user.currency < offer.listing.cost {
            return Err(self.record(QuestError::Validation(format!(
                "{} costs {} but you have {}",
                offer.item.name, offer.listing.cost, user.currency
            ))));
        }

        self.backend
            .buy_listing(user.id, listing_id)
            .await
            .map_err(|e| self.record(e))?;
        info!("User {} bought {} (listing {})", user.id, offer.item.name, listing_id);

        {
            let mut offers = write_lock(&self.offers);
            if let Some(o) = offers.iter_mut().find(|o| o.listing.id == listing_id) {
                o.listing.availability -= 1;
            }
        }
        *write_lock(&self.last_error) = None;

        // The purchase itself succeeded; a failed refresh only leaves a stale balance
        if let Err(e) = self.session.reload_user().await {
            warn!("Balance refresh after purchase failed: {}", e);
        }
        Ok(())
    }

    fn record(&self, error: QuestError) -> QuestError {
        *write_lock(&self.last_error) = Some(error.clone());
        error
    }
}
