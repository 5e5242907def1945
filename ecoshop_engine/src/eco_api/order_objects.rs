use serde::{Deserialize, Serialize};

use crate::{db_types::Order, traits::GatewayInstruction};

/// A request to buy a single product directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub address_id: i64,
    /// `None` or `0` means no voucher.
    #[serde(default)]
    pub voucher_id: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
    pub payment_method: String,
    pub product_id: i64,
    pub quantity: i64,
}

impl CreateOrderRequest {
    pub fn voucher(&self) -> Option<i64> {
        self.voucher_id.filter(|id| *id != 0)
    }
}

/// A request to check out a selection of cart items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCartOrderRequest {
    pub address_id: i64,
    #[serde(default)]
    pub voucher_id: Option<i64>,
    #[serde(default)]
    pub note: Option<String>,
    pub payment_method: String,
    pub cart_item_ids: Vec<i64>,
}

impl CreateCartOrderRequest {
    pub fn voucher(&self) -> Option<i64> {
        self.voucher_id.filter(|id| *id != 0)
    }

    /// The requested cart item ids, with duplicates removed and the original order kept.
    pub fn unique_item_ids(&self) -> Vec<i64> {
        let mut ids = Vec::with_capacity(self.cart_item_ids.len());
        for id in &self.cart_item_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

/// The result of placing an order. Manual payments are confirmed later by an admin; gateway payments come with
/// whatever the gateway wants the customer to do next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "payment_flow", rename_all = "snake_case")]
pub enum OrderPlacement {
    Manual { order: Order },
    Gateway { order: Order, instruction: GatewayInstruction },
}

impl OrderPlacement {
    pub fn order(&self) -> &Order {
        match self {
            OrderPlacement::Manual { order } => order,
            OrderPlacement::Gateway { order, .. } => order,
        }
    }

    pub fn into_order(self) -> Order {
        match self {
            OrderPlacement::Manual { order } => order,
            OrderPlacement::Gateway { order, .. } => order,
        }
    }
}

/// The outcome of a gateway callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackOutcome {
    /// The payment was confirmed and loyalty points accrued.
    Confirmed,
    /// The payment failed and the stock was given back.
    Failed,
    /// The gateway still reports the payment as pending. Nothing changed.
    Pending,
    /// The order had already been settled by an earlier delivery. Nothing changed.
    AlreadySettled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackResult {
    pub outcome: CallbackOutcome,
    pub order: Order,
}
