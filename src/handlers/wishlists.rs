use crate::handlers::common::{success_response, validate_input, validate_positive_decimal};
use crate::{errors::ServiceError, models::wishlist::WishlistItem, AppState};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Creates the router for wishlist endpoints
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{session}", get(get_wishlist))
        .route("/{session}/toggle", post(toggle_item))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ToggleItemRequest {
    pub product_id: Uuid,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(custom = "validate_positive_decimal")]
    pub unit_price: Decimal,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleItemResponse {
    /// Whether the product ended up saved after the toggle
    pub saved: bool,
    pub items: Vec<WishlistItem>,
}

async fn get_wishlist(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let wishlist = state.services.wishlists.get_wishlist(&session).await?;
    Ok(success_response(wishlist))
}

async fn toggle_item(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(payload): Json<ToggleItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    validate_input(&payload)?;

    let item = WishlistItem {
        product_id: payload.product_id,
        name: payload.name,
        unit_price: payload.unit_price,
        image: payload.image,
    };

    let (wishlist, saved) = state.services.wishlists.toggle(&session, item).await?;
    Ok(success_response(ToggleItemResponse {
        saved,
        items: wishlist.items().to_vec(),
    }))
}
