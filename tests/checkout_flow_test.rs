//! Integration tests for the checkout orchestrator.
//!
//! Driven against in-memory doubles for the order writer, payment gateway,
//! and snapshot store, so the full flow runs hermetically:
//! - validation gates (address, empty cart, payment-method eligibility)
//! - the COD path (order written pending, cart cleared)
//! - the online path (suspension, verified callback, failure callback)
//! - the severe partial state: payment captured, order write failed

mod common;

use assert_matches::assert_matches;
use common::{checkout_fixture, reference_item, StubGateway};
use rust_decimal_macros::dec;
use std::sync::atomic::Ordering;
use storefront_api::errors::ServiceError;
use storefront_api::models::address::ShippingAddress;
use storefront_api::models::payment::{PaymentDetails, PaymentMethod, PaymentStatus};
use storefront_api::services::checkout::{CheckoutOutcome, PlaceOrderRequest, Shopper};

fn shopper() -> Shopper {
    Shopper {
        id: "uid-1001".to_string(),
        email: "asha@example.com".to_string(),
    }
}

fn complete_address() -> ShippingAddress {
    ShippingAddress {
        name: "Asha Verma".to_string(),
        email: Some("asha@example.com".to_string()),
        phone: "+91 98765 43210".to_string(),
        line1: "14 Lakeview Road".to_string(),
        city: Some("Pune".to_string()),
        state: Some("MH".to_string()),
        postal_code: Some("411001".to_string()),
    }
}

fn request(method: PaymentMethod) -> PlaceOrderRequest {
    PlaceOrderRequest {
        shipping_address: complete_address(),
        payment_method: method,
        idempotency_key: None,
    }
}

// ==================== Validation gates ====================

#[tokio::test]
async fn empty_cart_is_rejected_before_anything_runs() {
    let fixture = checkout_fixture(900);

    let err = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Cod))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::EmptyCart);
    assert_eq!(fixture.orders.created_count(), 0);
}

#[tokio::test]
async fn blank_address_name_fails_without_calling_the_order_writer() {
    let fixture = checkout_fixture(900);
    fixture
        .carts
        .add_item("sess-1", reference_item(1))
        .await
        .unwrap();

    let mut req = request(PaymentMethod::Cod);
    req.shipping_address.name = String::new();

    let err = fixture
        .checkout
        .place_order("sess-1", &shopper(), req)
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::IncompleteAddress(fields) if fields.contains("name"));
    assert_eq!(fixture.orders.created_count(), 0);
    // The cart is untouched.
    let cart = fixture.carts.get_cart("sess-1").await.unwrap();
    assert_eq!(cart.len(), 1);
}

#[tokio::test]
async fn online_below_minimum_subtotal_is_ineligible() {
    let fixture = checkout_fixture(900);
    let mut cheap = reference_item(1);
    cheap.unit_price = dec!(499);
    fixture.carts.add_item("sess-1", cheap).await.unwrap();

    let err = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Online))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::PaymentMethodIneligible(_));
    assert_eq!(fixture.orders.created_count(), 0);
    assert!(fixture.gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn online_at_exactly_the_minimum_is_allowed() {
    let fixture = checkout_fixture(900);
    let mut item = reference_item(1);
    item.unit_price = dec!(500);
    fixture.carts.add_item("sess-1", item).await.unwrap();

    let outcome = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Online))
        .await
        .unwrap();

    assert_matches!(outcome, CheckoutOutcome::AwaitingPayment(_));
}

// ==================== COD path ====================

#[tokio::test]
async fn cod_end_to_end_scenario() {
    let fixture = checkout_fixture(900);
    fixture
        .carts
        .add_item("sess-1", reference_item(1))
        .await
        .unwrap();

    let outcome = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Cod))
        .await
        .unwrap();

    let placed = match outcome {
        CheckoutOutcome::Placed(placed) => placed,
        other => panic!("expected a placed order, got {:?}", other),
    };

    // Reference pricing vector for a 1749 subtotal.
    assert_eq!(placed.quote.subtotal, dec!(1749));
    assert_eq!(placed.quote.tax, dec!(315));
    assert_eq!(placed.quote.total, dec!(2064));
    assert_eq!(placed.quote.cod_advance, dec!(175));
    assert_eq!(placed.payment_status, PaymentStatus::Pending);

    // Exactly one order, pending, with the COD breakdown attached.
    assert_eq!(fixture.orders.created_count(), 1);
    let draft = fixture.orders.last_draft();
    assert_eq!(draft.payment_status, PaymentStatus::Pending);
    assert_eq!(draft.payment_method, PaymentMethod::Cod);
    assert_matches!(
        draft.payment_details,
        Some(PaymentDetails::CodAdvance { advance_paid, due_on_delivery })
            if advance_paid == dec!(175) && due_on_delivery == dec!(1889)
    );

    // Success path clears the cart.
    let cart = fixture.carts.get_cart("sess-1").await.unwrap();
    assert!(cart.is_empty());

    // No provider order was opened on the COD path.
    assert!(fixture.gateway.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn cod_order_writer_failure_preserves_cart() {
    let fixture = checkout_fixture(900);
    fixture
        .carts
        .add_item("sess-1", reference_item(2))
        .await
        .unwrap();
    fixture.orders.fail_next.store(true, Ordering::SeqCst);

    let err = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Cod))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::DatabaseError(_));
    let cart = fixture.carts.get_cart("sess-1").await.unwrap();
    assert_eq!(cart.len(), 1);
}

// ==================== Online path ====================

#[tokio::test]
async fn online_success_flow_writes_paid_order_and_clears_cart() {
    let fixture = checkout_fixture(900);
    fixture
        .carts
        .add_item("sess-1", reference_item(1))
        .await
        .unwrap();

    let outcome = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Online))
        .await
        .unwrap();

    let handoff = match outcome {
        CheckoutOutcome::AwaitingPayment(handoff) => handoff,
        other => panic!("expected a payment handoff, got {:?}", other),
    };

    // The gateway was asked for the full quoted total, and nothing has been
    // written while the attempt is suspended.
    assert_eq!(handoff.amount, dec!(2064));
    assert_eq!(handoff.key_id, "key_test");
    assert_eq!(fixture.orders.created_count(), 0);
    assert_eq!(fixture.checkout.pending_attempts(), 1);

    let callback = StubGateway::success_callback(&handoff.provider_order_id, "pay_777");
    let placed = fixture.checkout.confirm_payment(callback).await.unwrap();

    assert_eq!(placed.payment_status, PaymentStatus::Paid);
    assert_eq!(fixture.orders.created_count(), 1);
    let draft = fixture.orders.last_draft();
    assert_eq!(draft.payment_status, PaymentStatus::Paid);
    assert_matches!(
        draft.payment_details,
        Some(PaymentDetails::Gateway { ref provider_payment_id, .. })
            if provider_payment_id == "pay_777"
    );

    let cart = fixture.carts.get_cart("sess-1").await.unwrap();
    assert!(cart.is_empty());
    assert_eq!(fixture.checkout.pending_attempts(), 0);
}

#[tokio::test]
async fn online_failure_callback_preserves_cart_and_writes_nothing() {
    let fixture = checkout_fixture(900);
    fixture
        .carts
        .add_item("sess-1", reference_item(1))
        .await
        .unwrap();

    let outcome = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Online))
        .await
        .unwrap();
    let handoff = match outcome {
        CheckoutOutcome::AwaitingPayment(handoff) => handoff,
        other => panic!("expected a payment handoff, got {:?}", other),
    };

    fixture
        .checkout
        .report_payment_failure(&handoff.provider_order_id, "card declined")
        .await;

    assert_eq!(fixture.orders.created_count(), 0);
    let cart = fixture.carts.get_cart("sess-1").await.unwrap();
    assert_eq!(cart.len(), 1);
    assert_eq!(fixture.checkout.pending_attempts(), 0);
}

#[tokio::test]
async fn forged_callback_is_rejected_and_attempt_survives() {
    let fixture = checkout_fixture(900);
    fixture
        .carts
        .add_item("sess-1", reference_item(1))
        .await
        .unwrap();

    let outcome = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Online))
        .await
        .unwrap();
    let handoff = match outcome {
        CheckoutOutcome::AwaitingPayment(handoff) => handoff,
        other => panic!("expected a payment handoff, got {:?}", other),
    };

    let mut forged = StubGateway::success_callback(&handoff.provider_order_id, "pay_777");
    forged.signature = "deadbeef".to_string();

    let err = fixture.checkout.confirm_payment(forged).await.unwrap_err();
    assert_matches!(err, ServiceError::PaymentVerificationFailed);

    // The forged relay neither wrote an order nor consumed the attempt.
    assert_eq!(fixture.orders.created_count(), 0);
    assert_eq!(fixture.checkout.pending_attempts(), 1);

    let genuine = StubGateway::success_callback(&handoff.provider_order_id, "pay_777");
    assert!(fixture.checkout.confirm_payment(genuine).await.is_ok());
}

#[tokio::test]
async fn callback_for_unknown_attempt_is_not_found() {
    let fixture = checkout_fixture(900);

    let err = fixture
        .checkout
        .confirm_payment(StubGateway::success_callback("order_unknown", "pay_1"))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn expired_attempt_is_gone_when_the_callback_finally_arrives() {
    // Zero TTL: the attempt expires the moment it is parked.
    let fixture = checkout_fixture(0);
    fixture
        .carts
        .add_item("sess-1", reference_item(1))
        .await
        .unwrap();

    let outcome = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Online))
        .await
        .unwrap();
    let handoff = match outcome {
        CheckoutOutcome::AwaitingPayment(handoff) => handoff,
        other => panic!("expected a payment handoff, got {:?}", other),
    };

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let err = fixture
        .checkout
        .confirm_payment(StubGateway::success_callback(
            &handoff.provider_order_id,
            "pay_late",
        ))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::CheckoutExpired);
    assert_eq!(fixture.orders.created_count(), 0);
    assert_eq!(fixture.checkout.pending_attempts(), 0);
}

#[tokio::test]
async fn persistence_failure_after_captured_payment_is_surfaced_distinctly() {
    let fixture = checkout_fixture(900);
    fixture
        .carts
        .add_item("sess-1", reference_item(1))
        .await
        .unwrap();

    let outcome = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Online))
        .await
        .unwrap();
    let handoff = match outcome {
        CheckoutOutcome::AwaitingPayment(handoff) => handoff,
        other => panic!("expected a payment handoff, got {:?}", other),
    };

    fixture.orders.fail_next.store(true, Ordering::SeqCst);

    let err = fixture
        .checkout
        .confirm_payment(StubGateway::success_callback(
            &handoff.provider_order_id,
            "pay_911",
        ))
        .await
        .unwrap_err();

    // Not a plain payment failure: the money moved.
    assert_matches!(
        err,
        ServiceError::OrderPersistenceFailedAfterPayment { ref provider_payment_id }
            if provider_payment_id == "pay_911"
    );

    // The attempt is not silently retried.
    assert_eq!(fixture.checkout.pending_attempts(), 0);
}

#[tokio::test]
async fn gateway_create_failure_surfaces_and_preserves_cart() {
    let fixture = checkout_fixture(900);
    fixture
        .carts
        .add_item("sess-1", reference_item(1))
        .await
        .unwrap();
    fixture.gateway.fail_create.store(true, Ordering::SeqCst);

    let err = fixture
        .checkout
        .place_order("sess-1", &shopper(), request(PaymentMethod::Online))
        .await
        .unwrap_err();

    assert_matches!(err, ServiceError::PaymentFailed(_));
    assert_eq!(fixture.orders.created_count(), 0);
    assert_eq!(fixture.carts.get_cart("sess-1").await.unwrap().len(), 1);
}

// ==================== Idempotency ====================

#[tokio::test]
async fn resubmitting_with_the_same_idempotency_key_creates_one_order() {
    let fixture = checkout_fixture(900);
    fixture
        .carts
        .add_item("sess-1", reference_item(1))
        .await
        .unwrap();

    let mut req = request(PaymentMethod::Cod);
    req.idempotency_key = Some("attempt-42".to_string());

    let first = fixture
        .checkout
        .place_order("sess-1", &shopper(), req.clone())
        .await
        .unwrap();

    // The shopper resubmits the same attempt (cart restored for the retry).
    fixture
        .carts
        .add_item("sess-1", reference_item(1))
        .await
        .unwrap();
    let second = fixture
        .checkout
        .place_order("sess-1", &shopper(), req)
        .await
        .unwrap();

    let (first_id, second_id) = match (first, second) {
        (CheckoutOutcome::Placed(a), CheckoutOutcome::Placed(b)) => (a.order_id, b.order_id),
        other => panic!("expected two placed orders, got {:?}", other),
    };

    assert_eq!(first_id, second_id);
    assert_eq!(fixture.orders.created_count(), 1);
}
