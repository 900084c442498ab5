use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use crate::entities::order::{PaymentMethod, PaymentStatus};

/// Payment payload attached to a persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentDetails {
    /// Cash on delivery: the advance charged at order time and the
    /// remainder collected at physical delivery, outside this system.
    CodAdvance {
        advance_paid: Decimal,
        due_on_delivery: Decimal,
    },
    /// Hosted gateway capture, as relayed by the verified success callback.
    Gateway {
        provider_order_id: String,
        provider_payment_id: String,
        signature: String,
    },
}

/// The provider's client-relayed success callback. Untrusted input: it must
/// pass signature verification before anything acts on it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentCallback {
    pub provider_order_id: String,
    pub provider_payment_id: String,
    pub signature: String,
}
