use axum::response::Json;
use serde_json::Value;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        description = "Catalog, carts, wishlists, checkout, and order persistence for a direct-to-consumer apparel storefront"
    ),
    paths(
        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::orders::create_order,
        crate::handlers::payments::create_payment_order,
        crate::handlers::notifications::send_email,
        crate::handlers::checkout::place_order,
        crate::handlers::checkout::confirm_payment,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::models::cart::CartItem,
        crate::models::cart::VariantKey,
        crate::models::wishlist::WishlistItem,
        crate::models::address::ShippingAddress,
        crate::models::payment::PaymentMethod,
        crate::models::payment::PaymentStatus,
        crate::models::payment::PaymentDetails,
        crate::models::payment::PaymentCallback,
        crate::services::pricing::PriceQuote,
        crate::services::orders::OrderConfirmation,
        crate::services::checkout::PlaceOrderRequest,
        crate::services::checkout::OrderPlaced,
        crate::services::checkout::PaymentHandoff,
        crate::services::checkout::CheckoutOutcome,
        crate::services::gateway::GatewayOrder,
        crate::services::notifications::EmailKind,
        crate::handlers::orders::CreateOrderRequest,
        crate::handlers::payments::CreatePaymentOrderRequest,
        crate::handlers::payments::CreatePaymentOrderResponse,
        crate::handlers::notifications::SendEmailRequest,
        crate::handlers::notifications::SendEmailResponse,
    )),
    tags(
        (name = "Products", description = "Catalog reads and writes"),
        (name = "Orders", description = "Order persistence and reads"),
        (name = "Payments", description = "Payment gateway adapter"),
        (name = "Checkout", description = "Checkout orchestration"),
        (name = "Notifications", description = "Outbound shopper notifications"),
    )
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document as raw JSON.
pub async fn serve_openapi() -> Json<Value> {
    Json(serde_json::to_value(ApiDoc::openapi()).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_lists_paths() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        let paths = json["paths"].as_object().unwrap();
        assert!(paths.contains_key("/api/products"));
        assert!(paths.contains_key("/api/checkout/{session}/place"));
    }
}
