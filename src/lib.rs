//! Storefront API Library
//!
//! Backend services for a direct-to-consumer apparel storefront: product
//! catalog, per-session carts and wishlists, checkout with cash-on-delivery
//! and hosted-gateway payment paths, and order persistence.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod services;
pub mod snapshot;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub auth: auth::AuthVerifier,
    pub services: handlers::AppServices,
    pub redis: Arc<redis::Client>,
}

/// Success envelope shared by every endpoint: `{success: true, data}`.
/// Failures use [`errors::ErrorResponse`] (`{success: false, error}`).
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Assembles the `/api` route tree.
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/products", handlers::products::routes())
        .nest("/orders", handlers::orders::routes())
        .nest("/payment", handlers::payments::routes())
        .route(
            "/send-email",
            axum::routing::post(handlers::notifications::send_email),
        )
        .nest("/cart", handlers::carts::routes())
        .nest("/wishlist", handlers::wishlists::routes())
        .nest("/checkout", handlers::checkout::routes())
}

pub async fn api_status() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    Json(json!({
        "status": "ok",
        "service": "storefront-api",
        "version": version,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let redis_status = match state.redis.get_async_connection().await {
        Ok(mut conn) => match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(_) => "healthy",
            Err(_) => "unhealthy",
        },
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": if db_status == "healthy" && redis_status == "healthy" { "healthy" } else { "unhealthy" },
        "checks": {
            "database": db_status,
            "snapshot_store": redis_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Top-level router: liveness, health, OpenAPI document, and the API tree.
pub fn app_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(|| async { "storefront-api up" }))
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .route("/api-docs/openapi.json", get(openapi::serve_openapi))
        .nest("/api", api_routes())
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let response = ApiResponse::success(json!({"id": 1}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["id"], json!(1));
    }
}
