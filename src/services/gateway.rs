//! Payment gateway adapter.
//!
//! Creates provider-side orders for the hosted payment flow and verifies the
//! client-relayed success callback against the provider's signature scheme.
//! The callback is untrusted input: nothing downstream runs until the
//! HMAC-SHA256 signature over `"{order_id}|{payment_id}"` checks out against
//! the server-held key secret.

use crate::{config::AppConfig, errors::ServiceError, models::payment::PaymentCallback};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{instrument, warn};
use utoipa::ToSchema;

type HmacSha256 = Hmac<Sha256>;

/// Request to open a provider-side order for one checkout attempt.
#[derive(Debug, Clone, Serialize)]
pub struct CreateGatewayOrder {
    /// Whole currency units; converted to minor units on the wire
    pub amount: Decimal,
    pub currency: String,
    /// Merchant-side receipt reference, unique per attempt
    pub receipt: String,
}

/// Provider order token handed to the hosted payment UI.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GatewayOrder {
    pub id: String,
    /// Minor currency units, as echoed by the provider
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a provider order; the returned token is exchanged during the
    /// client-side hosted flow.
    async fn create_order(&self, request: CreateGatewayOrder)
        -> Result<GatewayOrder, ServiceError>;

    /// Verifies a client-relayed payment callback. Must reject any payload
    /// whose signature does not match the server-held secret.
    fn verify_callback(&self, callback: &PaymentCallback) -> Result<(), ServiceError>;

    /// Public key id shared with the hosted payment UI.
    fn public_key_id(&self) -> &str;
}

/// Production adapter speaking HTTP to the hosted payment provider.
pub struct HostedGateway {
    http: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Serialize)]
struct GatewayOrderRequestWire<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct GatewayOrderWire {
    id: String,
    amount: i64,
    currency: String,
    receipt: String,
}

impl HostedGateway {
    pub fn new(base_url: String, key_id: String, key_secret: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            key_id,
            key_secret,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.gateway_base_url.clone(),
            cfg.gateway_key_id.clone(),
            cfg.gateway_key_secret.clone(),
        )
    }
}

#[async_trait]
impl PaymentGateway for HostedGateway {
    #[instrument(skip(self), fields(amount = %request.amount, receipt = %request.receipt))]
    async fn create_order(
        &self,
        request: CreateGatewayOrder,
    ) -> Result<GatewayOrder, ServiceError> {
        if request.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "payment amount must be greater than zero".to_string(),
            ));
        }

        let amount_minor = (request.amount * Decimal::from(100))
            .to_i64()
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "payment amount {} does not fit the wire format",
                    request.amount
                ))
            })?;

        let url = format!("{}/v1/orders", self.base_url);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&GatewayOrderRequestWire {
                amount: amount_minor,
                currency: &request.currency,
                receipt: &request.receipt,
            })
            .send()
            .await
            .map_err(|e| {
                ServiceError::ExternalServiceError(format!("payment provider unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "payment provider rejected order creation");
            return Err(ServiceError::PaymentFailed(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let wire: GatewayOrderWire = response.json().await.map_err(|e| {
            ServiceError::ExternalServiceError(format!("invalid provider response: {}", e))
        })?;

        Ok(GatewayOrder {
            id: wire.id,
            amount: wire.amount,
            currency: wire.currency,
            receipt: wire.receipt,
        })
    }

    fn verify_callback(&self, callback: &PaymentCallback) -> Result<(), ServiceError> {
        let mut mac = HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .map_err(|e| ServiceError::InternalError(format!("invalid gateway secret: {}", e)))?;
        mac.update(
            format!(
                "{}|{}",
                callback.provider_order_id, callback.provider_payment_id
            )
            .as_bytes(),
        );

        let signature = hex::decode(&callback.signature)
            .map_err(|_| ServiceError::PaymentVerificationFailed)?;

        // Constant-time comparison via the MAC itself.
        mac.verify_slice(&signature)
            .map_err(|_| ServiceError::PaymentVerificationFailed)
    }

    fn public_key_id(&self) -> &str {
        &self.key_id
    }
}

/// Computes the hex signature the provider attaches to a success callback.
/// Shared with tests and local tooling; production only ever verifies.
pub fn sign_callback(key_secret: &str, provider_order_id: &str, provider_payment_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(key_secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{}|{}", provider_order_id, provider_payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
