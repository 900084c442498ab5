use crate::models::payment::PaymentMethod;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the storefront services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Cart events
    CartItemAdded {
        session: String,
        product_id: Uuid,
    },
    CartItemRemoved {
        session: String,
        product_id: Uuid,
    },
    CartCleared {
        session: String,
    },

    // Wishlist events
    WishlistToggled {
        session: String,
        product_id: Uuid,
        saved: bool,
    },

    // Checkout events
    CheckoutStarted {
        session: String,
        method: PaymentMethod,
    },
    CheckoutCompleted {
        session: String,
        order_id: Uuid,
    },
    PaymentAuthorized {
        provider_order_id: String,
    },
    PaymentFailed {
        provider_order_id: String,
        reason: String,
    },
    /// Money moved but the order write failed; needs manual reconciliation.
    OrderPersistenceFailed {
        provider_payment_id: String,
    },

    // Order events
    OrderCreated(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is gone.
    /// Event delivery is best-effort and never blocks a shopper-facing path.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Background consumer for the event channel. Terminates when every sender
/// has been dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderPersistenceFailed {
                provider_payment_id,
            } => {
                // Keep this loud: a captured payment has no order record.
                tracing::error!(
                    provider_payment_id = %provider_payment_id,
                    "payment captured without an order record; reconcile manually"
                );
            }
            other => {
                info!(event = ?other, "domain event");
            }
        }
    }
    info!("Event channel closed; event processor exiting");
}
