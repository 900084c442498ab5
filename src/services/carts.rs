use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::cart::{Cart, CartItem, VariantKey},
    snapshot::{snapshot_key, SnapshotStore, CART_NAMESPACE},
};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Session-scoped cart service.
///
/// Carts are private to one client session: the in-process map is only a
/// fast path over the snapshot store, which is the durable copy. Every
/// mutation writes the full serialized cart back (write-through), so state
/// survives a restart.
#[derive(Clone)]
pub struct CartService {
    sessions: Arc<DashMap<String, Cart>>,
    store: Arc<dyn SnapshotStore>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(store: Arc<dyn SnapshotStore>, event_sender: Arc<EventSender>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            store,
            event_sender,
        }
    }

    async fn load(&self, session: &str) -> Result<Cart, ServiceError> {
        if let Some(cart) = self.sessions.get(session) {
            return Ok(cart.clone());
        }

        let key = snapshot_key(CART_NAMESPACE, session);
        match self.store.get(&key).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(cart) => Ok(cart),
                Err(e) => {
                    // No versioning scheme exists for stored snapshots; an
                    // unreadable one starts the session over rather than
                    // poisoning every later request.
                    warn!(session = %session, error = %e, "discarding unreadable cart snapshot");
                    Ok(Cart::new())
                }
            },
            None => Ok(Cart::new()),
        }
    }

    async fn persist(&self, session: &str, cart: Cart) -> Result<Cart, ServiceError> {
        let key = snapshot_key(CART_NAMESPACE, session);
        let raw = serde_json::to_string(&cart)?;
        self.store.put(&key, &raw).await?;
        self.sessions.insert(session.to_string(), cart.clone());
        Ok(cart)
    }

    /// Returns the session's cart, restoring it from the snapshot store if
    /// this process has not seen the session yet.
    pub async fn get_cart(&self, session: &str) -> Result<Cart, ServiceError> {
        self.load(session).await
    }

    /// Adds an item (merging by variant key) and persists the result.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn add_item(&self, session: &str, item: CartItem) -> Result<Cart, ServiceError> {
        let product_id = item.product_id;
        let mut cart = self.load(session).await?;
        cart.add_item(item);
        let cart = self.persist(session, cart).await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                session: session.to_string(),
                product_id,
            })
            .await;

        Ok(cart)
    }

    /// Overwrites the quantity of one variant row.
    #[instrument(skip(self, key), fields(product_id = %key.product_id))]
    pub async fn update_quantity(
        &self,
        session: &str,
        key: &VariantKey,
        quantity: i64,
    ) -> Result<Cart, ServiceError> {
        let mut cart = self.load(session).await?;
        cart.update_quantity(key, quantity)?;
        self.persist(session, cart).await
    }

    /// Removes one variant row.
    #[instrument(skip(self, key), fields(product_id = %key.product_id))]
    pub async fn remove_item(&self, session: &str, key: &VariantKey) -> Result<Cart, ServiceError> {
        let mut cart = self.load(session).await?;
        cart.remove_item(key);
        let cart = self.persist(session, cart).await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                session: session.to_string(),
                product_id: key.product_id,
            })
            .await;

        Ok(cart)
    }

    /// Empties the cart. The checkout orchestrator calls this exactly once,
    /// as the final step of a successful attempt.
    #[instrument(skip(self))]
    pub async fn clear(&self, session: &str) -> Result<(), ServiceError> {
        let mut cart = self.load(session).await?;
        cart.clear();
        self.persist(session, cart).await?;

        info!(session = %session, "cart cleared");
        self.event_sender
            .send_or_log(Event::CartCleared {
                session: session.to_string(),
            })
            .await;

        Ok(())
    }
}
