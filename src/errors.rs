use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every endpoint on failure.
///
/// The storefront front-end only looks at `success` and `error`; `details`
/// carries validation specifics when they exist.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `false` for error responses
    pub success: bool,
    /// Human-readable error description
    #[schema(example = "Validation error: shipping address is missing a phone number")]
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid quantity: {0} (must be at least 1)")]
    InvalidQuantity(i64),

    #[error("Incomplete shipping address: {0}")]
    IncompleteAddress(String),

    #[error("Invalid shipping address: {0}")]
    InvalidAddress(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Payment method not eligible: {0}")]
    PaymentMethodIneligible(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Payment signature verification failed")]
    PaymentVerificationFailed,

    #[error("Checkout attempt expired")]
    CheckoutExpired,

    #[error("Order could not be recorded after payment {provider_payment_id} was captured")]
    OrderPersistenceFailedAfterPayment { provider_payment_id: String },

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::BadRequest(_)
            | Self::InvalidQuantity(_)
            | Self::IncompleteAddress(_)
            | Self::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            Self::EmptyCart | Self::PaymentMethodIneligible(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) | Self::PaymentVerificationFailed => StatusCode::UNAUTHORIZED,
            Self::PaymentFailed(_) => StatusCode::PAYMENT_REQUIRED,
            Self::CheckoutExpired => StatusCode::GONE,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            Self::DatabaseError(_)
            | Self::OrderPersistenceFailedAfterPayment { .. }
            | Self::CacheError(_)
            | Self::SerializationError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::CacheError(_)
            | Self::SerializationError(_)
            | Self::InternalError(_)
            | Self::Other(_) => "Internal server error".to_string(),
            // The reconciliation case must stay distinguishable for the
            // shopper-facing banner and for support follow-up.
            Self::OrderPersistenceFailedAfterPayment { .. } => {
                "Your payment was received but the order could not be recorded. \
                 Please contact support before retrying."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        }

        let body = ErrorResponse {
            success: false,
            error: self.response_message(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn status_code_mapping() {
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::ValidationError("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::IncompleteAddress("name".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::InvalidQuantity(0).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::EmptyCart.status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::PaymentMethodIneligible("below minimum".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::PaymentFailed("declined".into()).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ServiceError::PaymentVerificationFailed.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::CheckoutExpired.status_code(),
            StatusCode::GONE
        );
        assert_eq!(
            ServiceError::ExternalServiceError("gateway down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ServiceError::OrderPersistenceFailedAfterPayment {
                provider_payment_id: "pay_1".into()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn response_message_hides_internal_details() {
        assert_eq!(
            ServiceError::CacheError("redis connection refused".into()).response_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::InternalError("poisoned lock".into()).response_message(),
            "Internal server error"
        );

        // User-facing errors keep their message.
        assert_eq!(
            ServiceError::EmptyCart.response_message(),
            "Cart is empty"
        );
        assert_eq!(
            ServiceError::IncompleteAddress("missing phone".into()).response_message(),
            "Incomplete shipping address: missing phone"
        );
    }

    #[test]
    fn persistence_after_payment_message_is_distinct() {
        let plain = ServiceError::PaymentFailed("declined".into()).response_message();
        let severe = ServiceError::OrderPersistenceFailedAfterPayment {
            provider_payment_id: "pay_9".into(),
        }
        .response_message();
        assert_ne!(plain, severe);
        assert!(severe.contains("contact support"));
    }

    #[tokio::test]
    async fn error_body_uses_envelope_shape() {
        let response = ServiceError::NotFound("missing product".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert!(!body.success);
        assert_eq!(body.error, "Not found: missing product");
    }
}
