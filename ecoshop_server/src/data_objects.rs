use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddCartItemRequest {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReduceCartItemRequest {
    pub quantity: i64,
}

/// The new fulfilment status of an order, as its Indonesian label (`Pengiriman`, `Selesai`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdateRequest {
    pub status: String,
}

/// A request to tell a customer about an order's status. `status` is the Indonesian label, e.g. `Konfirmasi`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusNotificationRequest {
    pub user_id: i64,
    pub status: String,
}
