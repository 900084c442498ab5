use crate::handlers::common::{created_response, success_response};
use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    models::payment::PaymentCallback,
    services::checkout::{PlaceOrderRequest, Shopper},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Creates the router for checkout endpoints
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{session}/place", post(place_order))
        .route("/payment/confirm", post(confirm_payment))
        .route("/payment/failure", post(report_payment_failure))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentFailureReport {
    pub provider_order_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Submit a checkout attempt for the session's cart
#[utoipa::path(
    post,
    path = "/api/checkout/{session}/place",
    params(("session" = String, Path, description = "Client session id")),
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed (COD) or payment handoff (online)"),
        (status = 400, description = "Incomplete address or invalid input", body = crate::errors::ErrorResponse),
        (status = 401, description = "Login required", body = crate::errors::ErrorResponse),
        (status = 422, description = "Empty cart or ineligible payment method", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    user: AuthenticatedUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let shopper = Shopper {
        id: user.id,
        email: user.email,
    };

    let outcome = state
        .services
        .checkout
        .place_order(&session, &shopper, payload)
        .await?;

    Ok(created_response(outcome))
}

/// Relay of the provider's success callback from the hosted payment flow
#[utoipa::path(
    post,
    path = "/api/checkout/payment/confirm",
    request_body = PaymentCallback,
    responses(
        (status = 201, description = "Payment verified and order recorded"),
        (status = 401, description = "Signature verification failed", body = crate::errors::ErrorResponse),
        (status = 410, description = "Attempt expired", body = crate::errors::ErrorResponse),
        (status = 500, description = "Payment captured but order not recorded", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Json(callback): Json<PaymentCallback>,
) -> Result<impl IntoResponse, ServiceError> {
    let placed = state.services.checkout.confirm_payment(callback).await?;
    Ok(created_response(placed))
}

async fn report_payment_failure(
    State(state): State<Arc<AppState>>,
    Json(report): Json<PaymentFailureReport>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .checkout
        .report_payment_failure(
            &report.provider_order_id,
            report.reason.as_deref().unwrap_or("payment failed"),
        )
        .await;

    Ok(success_response(serde_json::json!({
        "message": "Payment failure recorded; cart preserved"
    })))
}
