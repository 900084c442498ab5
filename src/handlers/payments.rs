use crate::handlers::common::{validate_input, validate_positive_decimal};
use crate::{
    errors::ServiceError,
    services::gateway::{CreateGatewayOrder, GatewayOrder},
    AppState,
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for payment endpoints
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/create-order", post(create_payment_order))
}

/// Prefill details forwarded by the storefront; the hosted payment UI reads
/// them client-side, the provider order itself does not.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CustomerDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentOrderRequest {
    #[validate(custom = "validate_positive_decimal")]
    pub amount: Decimal,
    #[validate(length(min = 1))]
    pub receipt: String,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePaymentOrderResponse {
    pub success: bool,
    pub order: GatewayOrder,
    /// Public key id the hosted payment UI initializes with
    pub key_id: String,
}

/// Open a provider-side payment order for one checkout attempt
#[utoipa::path(
    post,
    path = "/api/payment/create-order",
    request_body = CreatePaymentOrderRequest,
    responses(
        (status = 200, description = "Provider order created", body = CreatePaymentOrderResponse),
        (status = 400, description = "Invalid amount", body = crate::errors::ErrorResponse),
        (status = 402, description = "Provider rejected the order", body = crate::errors::ErrorResponse),
        (status = 502, description = "Provider unreachable", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn create_payment_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreatePaymentOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let order = state
        .services
        .gateway
        .create_order(CreateGatewayOrder {
            amount: payload.amount,
            currency: state.config.currency.clone(),
            receipt: payload.receipt,
        })
        .await?;

    Ok((
        StatusCode::OK,
        Json(CreatePaymentOrderResponse {
            success: true,
            order,
            key_id: state.services.gateway.public_key_id().to_string(),
        }),
    ))
}
