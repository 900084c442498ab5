use crate::handlers::common::{created_response, success_response, PaginationParams};
use crate::{
    errors::ServiceError,
    models::{
        address::ShippingAddress,
        cart::CartItem,
        payment::{PaymentDetails, PaymentMethod, PaymentStatus},
    },
    services::orders::{OrderDraft, OrderWriter},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Creates the router for order endpoints
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order))
}

/// Order draft accepted by the order creation endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub user_email: String,
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_details: Option<PaymentDetails>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<crate::services::orders::OrderResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Persist an order document assembled by a trusted caller
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created"),
        (status = 400, description = "Missing or invalid fields", body = crate::errors::ErrorResponse),
        (status = 500, description = "Persistence failure", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let draft = OrderDraft {
        user_id: payload.user_id,
        user_email: payload.user_email,
        items: payload.items,
        shipping_address: payload.shipping_address,
        payment_method: payload.payment_method,
        payment_status: payload.payment_status,
        payment_details: payload.payment_details,
        currency: state.config.currency.clone(),
        subtotal: payload.subtotal,
        tax: payload.tax,
        total: payload.total,
        idempotency_key: payload.idempotency_key,
    };

    let confirmation = state.services.orders.create_order(draft).await?;
    Ok(created_response(confirmation))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(success_response(order))
}

async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(pagination): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let (orders, total) = state
        .services
        .orders
        .list_orders(pagination.page, pagination.per_page)
        .await?;

    Ok(success_response(OrderListResponse {
        orders,
        total,
        page: pagination.page,
        per_page: pagination.per_page,
    }))
}
