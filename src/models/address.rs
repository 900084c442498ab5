use crate::errors::ServiceError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Shipping address owned by the active checkout attempt. Never persisted
/// independently of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddress {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
    pub line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl ShippingAddress {
    /// Names of the required fields that are missing or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        if self.line1.trim().is_empty() {
            missing.push("line1");
        }
        missing
    }

    /// Checkout-side gate: fails with `IncompleteAddress` naming the blanks.
    pub fn ensure_complete(&self) -> Result<(), ServiceError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::IncompleteAddress(missing.join(", ")))
        }
    }

    /// Order-writer-side defensive re-check of the same requirements.
    pub fn ensure_valid_for_order(&self) -> Result<(), ServiceError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::InvalidAddress(missing.join(", ")))
        }
    }
}
