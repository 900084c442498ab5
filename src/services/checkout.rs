//! Checkout orchestrator.
//!
//! Drives one checkout attempt through
//! `Idle → Validating → (ProcessingCod | ProcessingOnline) → {Succeeded | Failed}`:
//! validates the shopper's address and payment-method eligibility, branches
//! on the payment path, calls the payment gateway or skips it, invokes the
//! order writer, and clears the cart exactly once on success. No automatic
//! retry exists at any transition; every retry is shopper-initiated and
//! restarts at validation.

use crate::{
    errors::ServiceError,
    events::{Event, EventSender},
    models::{
        address::ShippingAddress,
        cart::CartItem,
        payment::{PaymentCallback, PaymentDetails, PaymentMethod, PaymentStatus},
    },
    services::{
        carts::CartService,
        gateway::{CreateGatewayOrder, PaymentGateway},
        orders::{OrderDraft, OrderWriter},
        pricing::{PriceQuote, PricingPolicy},
    },
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// The authenticated shopper placing the order. Identity is established by
/// the handler layer before the orchestrator runs.
#[derive(Debug, Clone)]
pub struct Shopper {
    pub id: String,
    pub email: String,
}

/// One submitted checkout form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    /// Client-generated token per attempt; resubmission with the same token
    /// is a no-op returning the first confirmation
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// A completed checkout: the order exists and the cart has been cleared.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub order_number: String,
    pub payment_status: PaymentStatus,
    pub quote: PriceQuote,
}

/// A suspended online attempt: the provider-hosted UI takes over from here.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentHandoff {
    pub provider_order_id: String,
    /// Whole currency units to be charged (equals the quoted total)
    pub amount: rust_decimal::Decimal,
    pub currency: String,
    /// Public key id the hosted payment UI initializes with
    pub key_id: String,
}

/// Outcome of a `place_order` call.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckoutOutcome {
    Placed(OrderPlaced),
    AwaitingPayment(PaymentHandoff),
}

/// A parked online attempt, waiting for the provider callback.
#[derive(Debug, Clone)]
struct PendingAttempt {
    session: String,
    shopper_id: String,
    shopper_email: String,
    items: Vec<CartItem>,
    shipping_address: ShippingAddress,
    quote: PriceQuote,
    idempotency_key: Option<String>,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct CheckoutService {
    pricing: PricingPolicy,
    currency: String,
    attempt_ttl: Duration,
    carts: Arc<CartService>,
    orders: Arc<dyn OrderWriter>,
    gateway: Arc<dyn PaymentGateway>,
    event_sender: Arc<EventSender>,
    pending: Arc<DashMap<String, PendingAttempt>>,
}

impl CheckoutService {
    pub fn new(
        pricing: PricingPolicy,
        currency: String,
        attempt_ttl_secs: u64,
        carts: Arc<CartService>,
        orders: Arc<dyn OrderWriter>,
        gateway: Arc<dyn PaymentGateway>,
        event_sender: Arc<EventSender>,
    ) -> Self {
        Self {
            pricing,
            currency,
            attempt_ttl: Duration::seconds(attempt_ttl_secs as i64),
            carts,
            orders,
            gateway,
            event_sender,
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Submits one checkout attempt.
    ///
    /// The validation sequence runs before anything external is touched: an
    /// order is never created, and no provider order is opened, for an
    /// attempt that fails a precondition.
    #[instrument(skip(self, shopper, request), fields(method = ?request.payment_method))]
    pub async fn place_order(
        &self,
        session: &str,
        shopper: &Shopper,
        request: PlaceOrderRequest,
    ) -> Result<CheckoutOutcome, ServiceError> {
        // Validating
        let cart = self.carts.get_cart(session).await?;
        if cart.is_empty() {
            return Err(ServiceError::EmptyCart);
        }
        request.shipping_address.ensure_complete()?;

        let quote = self.pricing.quote(cart.subtotal());
        self.pricing
            .ensure_method_eligible(request.payment_method, quote.subtotal)?;

        self.event_sender
            .send_or_log(Event::CheckoutStarted {
                session: session.to_string(),
                method: request.payment_method,
            })
            .await;

        match request.payment_method {
            PaymentMethod::Cod => {
                self.place_cod_order(session, shopper, request, cart.items().to_vec(), quote)
                    .await
            }
            PaymentMethod::Online => {
                self.start_online_payment(session, shopper, request, cart.items().to_vec(), quote)
                    .await
            }
        }
    }

    /// ProcessingCOD: the advance is collected out-of-band at order time and
    /// the remainder at delivery, so no provider call happens on this path.
    /// The order is written directly with a pending payment status.
    async fn place_cod_order(
        &self,
        session: &str,
        shopper: &Shopper,
        request: PlaceOrderRequest,
        items: Vec<CartItem>,
        quote: PriceQuote,
    ) -> Result<CheckoutOutcome, ServiceError> {
        let draft = OrderDraft {
            user_id: shopper.id.clone(),
            user_email: shopper.email.clone(),
            items,
            shipping_address: request.shipping_address,
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            payment_details: Some(PaymentDetails::CodAdvance {
                advance_paid: quote.cod_advance,
                due_on_delivery: quote.due_on_delivery(),
            }),
            currency: self.currency.clone(),
            subtotal: quote.subtotal,
            tax: quote.tax,
            total: quote.total,
            idempotency_key: request.idempotency_key,
        };

        let confirmation = self.orders.create_order(draft).await?;

        self.finish_success(session, confirmation.order_id).await?;

        Ok(CheckoutOutcome::Placed(OrderPlaced {
            order_id: confirmation.order_id,
            order_number: confirmation.order_number,
            payment_status: PaymentStatus::Pending,
            quote,
        }))
    }

    /// ProcessingOnline, first half: open the provider order and suspend.
    /// The attempt is parked until the provider calls back or it expires.
    async fn start_online_payment(
        &self,
        session: &str,
        shopper: &Shopper,
        request: PlaceOrderRequest,
        items: Vec<CartItem>,
        quote: PriceQuote,
    ) -> Result<CheckoutOutcome, ServiceError> {
        self.sweep_expired();

        let receipt = format!("rcpt-{}", Uuid::new_v4());
        let provider_order = self
            .gateway
            .create_order(CreateGatewayOrder {
                amount: quote.total,
                currency: self.currency.clone(),
                receipt,
            })
            .await?;

        let attempt = PendingAttempt {
            session: session.to_string(),
            shopper_id: shopper.id.clone(),
            shopper_email: shopper.email.clone(),
            items,
            shipping_address: request.shipping_address,
            quote,
            idempotency_key: request.idempotency_key,
            expires_at: Utc::now() + self.attempt_ttl,
        };
        self.pending.insert(provider_order.id.clone(), attempt);

        info!(provider_order_id = %provider_order.id, "online payment attempt suspended");

        Ok(CheckoutOutcome::AwaitingPayment(PaymentHandoff {
            provider_order_id: provider_order.id,
            amount: quote.total,
            currency: self.currency.clone(),
            key_id: self.gateway.public_key_id().to_string(),
        }))
    }

    /// ProcessingOnline, second half: the provider's success callback.
    ///
    /// The callback is untrusted until its signature verifies against the
    /// server-held secret. Only then is the order written — so no order ever
    /// exists for an online payment the provider has not reported
    /// successful. A persistence failure after verification is the one
    /// outcome that must not look like an ordinary payment failure.
    #[instrument(skip(self, callback), fields(provider_order_id = %callback.provider_order_id))]
    pub async fn confirm_payment(
        &self,
        callback: PaymentCallback,
    ) -> Result<OrderPlaced, ServiceError> {
        let attempt = self
            .pending
            .get(&callback.provider_order_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "no pending payment attempt for provider order {}",
                    callback.provider_order_id
                ))
            })?;

        if attempt.expires_at < Utc::now() {
            self.pending.remove(&callback.provider_order_id);
            warn!("payment callback arrived after the attempt expired");
            return Err(ServiceError::CheckoutExpired);
        }

        // A forged callback must not consume the attempt; the legitimate
        // one can still arrive.
        self.gateway.verify_callback(&callback)?;

        self.event_sender
            .send_or_log(Event::PaymentAuthorized {
                provider_order_id: callback.provider_order_id.clone(),
            })
            .await;

        let draft = OrderDraft {
            user_id: attempt.shopper_id.clone(),
            user_email: attempt.shopper_email.clone(),
            items: attempt.items.clone(),
            shipping_address: attempt.shipping_address.clone(),
            payment_method: PaymentMethod::Online,
            payment_status: PaymentStatus::Paid,
            payment_details: Some(PaymentDetails::Gateway {
                provider_order_id: callback.provider_order_id.clone(),
                provider_payment_id: callback.provider_payment_id.clone(),
                signature: callback.signature.clone(),
            }),
            currency: self.currency.clone(),
            subtotal: attempt.quote.subtotal,
            tax: attempt.quote.tax,
            total: attempt.quote.total,
            idempotency_key: attempt.idempotency_key.clone(),
        };

        let confirmation = match self.orders.create_order(draft).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                // Money moved, the order did not. Park nothing, retry
                // nothing: escalate for manual reconciliation.
                self.pending.remove(&callback.provider_order_id);
                error!(
                    error = %e,
                    provider_payment_id = %callback.provider_payment_id,
                    "order write failed after captured payment"
                );
                self.event_sender
                    .send_or_log(Event::OrderPersistenceFailed {
                        provider_payment_id: callback.provider_payment_id.clone(),
                    })
                    .await;
                return Err(ServiceError::OrderPersistenceFailedAfterPayment {
                    provider_payment_id: callback.provider_payment_id,
                });
            }
        };

        self.pending.remove(&callback.provider_order_id);
        self.finish_success(&attempt.session, confirmation.order_id)
            .await?;

        Ok(OrderPlaced {
            order_id: confirmation.order_id,
            order_number: confirmation.order_number,
            payment_status: PaymentStatus::Paid,
            quote: attempt.quote,
        })
    }

    /// ProcessingOnline → Failed: the provider's failure callback. The cart
    /// is untouched and the shopper may resubmit, which re-enters
    /// validation as a fresh attempt.
    #[instrument(skip(self))]
    pub async fn report_payment_failure(&self, provider_order_id: &str, reason: &str) {
        if self.pending.remove(provider_order_id).is_some() {
            info!(reason = %reason, "online payment attempt failed; cart preserved");
        }
        self.event_sender
            .send_or_log(Event::PaymentFailed {
                provider_order_id: provider_order_id.to_string(),
                reason: reason.to_string(),
            })
            .await;
    }

    /// Number of attempts currently suspended (diagnostics).
    pub fn pending_attempts(&self) -> usize {
        self.pending.len()
    }

    async fn finish_success(&self, session: &str, order_id: Uuid) -> Result<(), ServiceError> {
        self.carts.clear(session).await?;
        self.event_sender
            .send_or_log(Event::CheckoutCompleted {
                session: session.to_string(),
                order_id,
            })
            .await;
        Ok(())
    }

    /// Drops attempts whose provider session can no longer call back in
    /// time. An abandoned provider-side order is reconciled out-of-band.
    fn sweep_expired(&self) {
        let now = Utc::now();
        self.pending.retain(|_, attempt| attempt.expires_at >= now);
    }
}
