//! Shared fixtures: in-memory doubles for the order writer, payment gateway,
//! and snapshot store, plus a wired checkout service.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storefront_api::errors::ServiceError;
use storefront_api::events::EventSender;
use storefront_api::models::cart::CartItem;
use storefront_api::models::payment::PaymentCallback;
use storefront_api::services::carts::CartService;
use storefront_api::services::checkout::CheckoutService;
use storefront_api::services::gateway::{
    sign_callback, CreateGatewayOrder, GatewayOrder, PaymentGateway,
};
use storefront_api::services::orders::{OrderConfirmation, OrderDraft, OrderWriter};
use storefront_api::services::pricing::PricingPolicy;
use storefront_api::snapshot::InMemorySnapshotStore;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const GATEWAY_SECRET: &str = "integration-test-gateway-secret";

/// Order writer double: records every accepted draft, optionally fails.
#[derive(Default)]
pub struct RecordingOrderWriter {
    pub orders: Mutex<Vec<OrderDraft>>,
    pub fail_next: AtomicBool,
}

impl RecordingOrderWriter {
    pub fn created_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn last_draft(&self) -> OrderDraft {
        self.orders.lock().unwrap().last().cloned().expect("an order was written")
    }
}

#[async_trait]
impl OrderWriter for RecordingOrderWriter {
    async fn create_order(&self, draft: OrderDraft) -> Result<OrderConfirmation, ServiceError> {
        draft.validate()?;

        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::DatabaseError(sea_orm::DbErr::Custom(
                "order store unreachable".to_string(),
            )));
        }

        // Idempotency: a repeated key returns the first confirmation.
        let mut orders = self.orders.lock().unwrap();
        if let Some(key) = draft.idempotency_key.as_deref() {
            if let Some(pos) = orders
                .iter()
                .position(|o| o.idempotency_key.as_deref() == Some(key))
            {
                return Ok(OrderConfirmation {
                    order_id: Uuid::from_u128(pos as u128 + 1),
                    order_number: format!("ORD-{:08}", pos + 1),
                });
            }
        }

        orders.push(draft);
        let n = orders.len();
        Ok(OrderConfirmation {
            order_id: Uuid::from_u128(n as u128),
            order_number: format!("ORD-{:08}", n),
        })
    }
}

/// Payment gateway double with real signature verification semantics.
pub struct StubGateway {
    pub created: Mutex<Vec<CreateGatewayOrder>>,
    pub fail_create: AtomicBool,
    counter: AtomicUsize,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            fail_create: AtomicBool::new(false),
            counter: AtomicUsize::new(0),
        }
    }
}

impl StubGateway {
    /// A correctly signed success callback for a provider order.
    pub fn success_callback(provider_order_id: &str, provider_payment_id: &str) -> PaymentCallback {
        PaymentCallback {
            provider_order_id: provider_order_id.to_string(),
            provider_payment_id: provider_payment_id.to_string(),
            signature: sign_callback(GATEWAY_SECRET, provider_order_id, provider_payment_id),
        }
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(
        &self,
        request: CreateGatewayOrder,
    ) -> Result<GatewayOrder, ServiceError> {
        if self.fail_create.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::PaymentFailed(
                "provider returned 503".to_string(),
            ));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let order = GatewayOrder {
            id: format!("order_test_{}", n),
            amount: 0,
            currency: request.currency.clone(),
            receipt: request.receipt.clone(),
        };
        self.created.lock().unwrap().push(request);
        Ok(order)
    }

    fn verify_callback(&self, callback: &PaymentCallback) -> Result<(), ServiceError> {
        let expected = sign_callback(
            GATEWAY_SECRET,
            &callback.provider_order_id,
            &callback.provider_payment_id,
        );
        if expected == callback.signature {
            Ok(())
        } else {
            Err(ServiceError::PaymentVerificationFailed)
        }
    }

    fn public_key_id(&self) -> &str {
        "key_test"
    }
}

pub struct TestCheckout {
    pub checkout: CheckoutService,
    pub carts: Arc<CartService>,
    pub orders: Arc<RecordingOrderWriter>,
    pub gateway: Arc<StubGateway>,
}

/// Wires a checkout service against the in-memory doubles.
pub fn checkout_fixture(attempt_ttl_secs: u64) -> TestCheckout {
    let (tx, mut rx) = mpsc::channel(256);
    // Drain events so senders never block.
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    let events = Arc::new(EventSender::new(tx));

    let carts = Arc::new(CartService::new(
        Arc::new(InMemorySnapshotStore::new()),
        events.clone(),
    ));
    let orders = Arc::new(RecordingOrderWriter::default());
    let gateway = Arc::new(StubGateway::default());

    let checkout = CheckoutService::new(
        PricingPolicy::default(),
        "INR".to_string(),
        attempt_ttl_secs,
        carts.clone(),
        orders.clone(),
        gateway.clone(),
        events,
    );

    TestCheckout {
        checkout,
        carts,
        orders,
        gateway,
    }
}

/// The reference item from the end-to-end scenario: unit price 1749.
pub fn reference_item(quantity: u32) -> CartItem {
    CartItem {
        product_id: Uuid::from_u128(1),
        name: "Oversized Graphic Tee".to_string(),
        image: Some("/images/tee.jpg".to_string()),
        unit_price: dec!(1749),
        color: Some("black".to_string()),
        size: Some("M".to_string()),
        quantity,
    }
}
