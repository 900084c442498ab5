pub mod carts;
pub mod checkout;
pub mod common;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod wishlists;

use crate::{
    config::AppConfig,
    db::DbPool,
    events::EventSender,
    services::{
        carts::CartService,
        catalog::CatalogService,
        checkout::CheckoutService,
        gateway::PaymentGateway,
        notifications::{Mailer, NotificationService},
        orders::{OrderService, OrderWriter},
        pricing::PricingPolicy,
        wishlists::WishlistService,
    },
    snapshot::SnapshotStore,
};
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub carts: Arc<CartService>,
    pub wishlists: Arc<WishlistService>,
    pub orders: Arc<OrderService>,
    pub checkout: Arc<CheckoutService>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub notifications: Arc<NotificationService>,
}

impl AppServices {
    /// Wires the service graph from its external collaborators.
    pub fn new(
        db: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        snapshot_store: Arc<dyn SnapshotStore>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        config: &AppConfig,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(db.clone(), event_sender.clone()));
        let carts = Arc::new(CartService::new(
            snapshot_store.clone(),
            event_sender.clone(),
        ));
        let wishlists = Arc::new(WishlistService::new(snapshot_store, event_sender.clone()));
        let orders = Arc::new(OrderService::new(db, event_sender.clone()));
        let order_writer: Arc<dyn OrderWriter> = orders.clone();

        let checkout = Arc::new(CheckoutService::new(
            PricingPolicy::from_config(config),
            config.currency.clone(),
            config.online_payment_timeout_secs,
            carts.clone(),
            order_writer,
            gateway.clone(),
            event_sender,
        ));

        let notifications = Arc::new(NotificationService::new(
            mailer,
            config.mailer_from.clone(),
        ));

        Self {
            catalog,
            carts,
            wishlists,
            orders,
            checkout,
            gateway,
            notifications,
        }
    }
}
