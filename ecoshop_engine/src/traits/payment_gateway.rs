use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::{OrderId, OrderStatusType, PaymentMethod, PaymentStatusType, Rupiah};

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The gateway gave a definitive answer: it will not take this payment.
    #[error("The payment gateway rejected the request: {0}")]
    Rejected(String),
    #[error("The payment gateway does not support {0}")]
    UnsupportedMethod(PaymentMethod),
    #[error("The payment gateway does not know order {0}")]
    UnknownOrder(OrderId),
    #[error("Could not reach the payment gateway: {0}")]
    Unavailable(String),
}

/// Whatever the gateway wants the customer to do next (a QR string, a virtual account number, a deeplink...). The
/// engine passes it through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayInstruction(pub serde_json::Value);

/// The gateway's view of an order's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayStatus {
    pub order_status: OrderStatusType,
    pub payment_status: PaymentStatusType,
}

/// The payment gateway. The wire protocol is the adapter's business; the engine only sees these two calls.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayAdapter {
    /// Opens a payment for `amount` against `order_id` using the given gateway `method`.
    async fn process(
        &self,
        amount: Rupiah,
        order_id: &OrderId,
        method: PaymentMethod,
    ) -> Result<GatewayInstruction, GatewayError>;

    /// Asks the gateway for the authoritative status of the payment for `order_id`.
    async fn check_status(&self, order_id: &OrderId) -> Result<GatewayStatus, GatewayError>;
}
