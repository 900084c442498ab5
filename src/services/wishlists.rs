use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::wishlist::{Wishlist, WishlistItem},
    snapshot::{snapshot_key, SnapshotStore, WISHLIST_NAMESPACE},
};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Session-scoped wishlist service. Same write-through snapshot side effect
/// as the cart service, under its own fixed namespace.
#[derive(Clone)]
pub struct WishlistService {
    sessions: Arc<DashMap<String, Wishlist>>,
    store: Arc<dyn SnapshotStore>,
    event_sender: Arc<EventSender>,
}

impl WishlistService {
    pub fn new(store: Arc<dyn SnapshotStore>, event_sender: Arc<EventSender>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            store,
            event_sender,
        }
    }

    async fn load(&self, session: &str) -> Result<Wishlist, ServiceError> {
        if let Some(list) = self.sessions.get(session) {
            return Ok(list.clone());
        }

        let key = snapshot_key(WISHLIST_NAMESPACE, session);
        match self.store.get(&key).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(list) => Ok(list),
                Err(e) => {
                    warn!(session = %session, error = %e, "discarding unreadable wishlist snapshot");
                    Ok(Wishlist::new())
                }
            },
            None => Ok(Wishlist::new()),
        }
    }

    async fn persist(&self, session: &str, list: Wishlist) -> Result<Wishlist, ServiceError> {
        let key = snapshot_key(WISHLIST_NAMESPACE, session);
        let raw = serde_json::to_string(&list)?;
        self.store.put(&key, &raw).await?;
        self.sessions.insert(session.to_string(), list.clone());
        Ok(list)
    }

    pub async fn get_wishlist(&self, session: &str) -> Result<Wishlist, ServiceError> {
        self.load(session).await
    }

    pub async fn contains(&self, session: &str, product_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.load(session).await?.contains(product_id))
    }

    /// Add if absent, remove if present. Returns the updated list and
    /// whether the item ended up saved.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn toggle(
        &self,
        session: &str,
        item: WishlistItem,
    ) -> Result<(Wishlist, bool), ServiceError> {
        let product_id = item.product_id;
        let mut list = self.load(session).await?;
        let saved = list.toggle(item);
        let list = self.persist(session, list).await?;

        self.event_sender
            .send_or_log(Event::WishlistToggled {
                session: session.to_string(),
                product_id,
                saved,
            })
            .await;

        Ok((list, saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::InMemorySnapshotStore;
    use rust_decimal_macros::dec;
    use tokio::sync::mpsc;

    fn service() -> (WishlistService, Arc<InMemorySnapshotStore>) {
        let store = Arc::new(InMemorySnapshotStore::new());
        let (tx, _rx) = mpsc::channel(64);
        let service = WishlistService::new(store.clone(), Arc::new(EventSender::new(tx)));
        (service, store)
    }

    fn item() -> WishlistItem {
        WishlistItem {
            product_id: Uuid::from_u128(5),
            name: "Corduroy Cap".into(),
            unit_price: dec!(799),
            image: None,
        }
    }

    #[tokio::test]
    async fn toggle_persists_both_directions() {
        let (service, _store) = service();

        let (list, saved) = service.toggle("sess-1", item()).await.unwrap();
        assert!(saved);
        assert_eq!(list.len(), 1);

        let (list, saved) = service.toggle("sess-1", item()).await.unwrap();
        assert!(!saved);
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn wishlist_survives_restart() {
        let (service, store) = service();
        service.toggle("sess-1", item()).await.unwrap();

        let (tx, _rx) = mpsc::channel(64);
        let revived = WishlistService::new(store, Arc::new(EventSender::new(tx)));
        assert!(revived
            .contains("sess-1", item().product_id)
            .await
            .unwrap());
    }
}
