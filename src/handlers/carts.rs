use crate::handlers::common::{success_response, validate_input, validate_positive_decimal};
use crate::{
    errors::ServiceError,
    models::cart::{Cart, CartItem, VariantKey},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for cart endpoints
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{session}", get(get_cart))
        .route("/{session}/items", post(add_item))
        .route("/{session}/items", put(update_quantity))
        .route("/{session}/items", delete(remove_item))
        .route("/{session}/clear", post(clear_cart))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1))]
    pub name: String,
    pub image: Option<String>,
    #[validate(custom = "validate_positive_decimal")]
    pub unit_price: Decimal,
    pub color: Option<String>,
    pub size: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub product_id: Uuid,
    pub color: Option<String>,
    pub size: Option<String>,
    pub quantity: i64,
}

/// Cart view returned to the storefront: rows plus the derived subtotal.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        Self {
            subtotal: cart.subtotal(),
            items: cart.items().to_vec(),
        }
    }
}

async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.carts.get_cart(&session).await?;
    Ok(success_response(CartResponse::from(cart)))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let item = CartItem {
        product_id: payload.product_id,
        name: payload.name,
        image: payload.image,
        unit_price: payload.unit_price,
        color: payload.color,
        size: payload.size,
        quantity: payload.quantity,
    };

    let cart = state.services.carts.add_item(&session, item).await?;
    Ok(success_response(CartResponse::from(cart)))
}

async fn update_quantity(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let key = VariantKey {
        product_id: payload.product_id,
        color: payload.color,
        size: payload.size,
    };

    let cart = state
        .services
        .carts
        .update_quantity(&session, &key, payload.quantity)
        .await?;
    Ok(success_response(CartResponse::from(cart)))
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Query(key): Query<VariantKey>,
) -> Result<impl IntoResponse, ServiceError> {
    let cart = state.services.carts.remove_item(&session, &key).await?;
    Ok(success_response(CartResponse::from(cart)))
}

async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.carts.clear(&session).await?;
    Ok(success_response(serde_json::json!({
        "message": "Cart cleared"
    })))
}
