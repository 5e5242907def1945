use serde::{Deserialize, Serialize};

use crate::db_types::{Order, StatusUpdate};

/// Published once an order, its details and all the inventory and voucher side effects have been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Published after a committed payment or fulfilment transition. `order` is the order as it is after the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub update: StatusUpdate,
}

impl OrderStatusChangedEvent {
    pub fn new(order: Order, update: StatusUpdate) -> Self {
        Self { order, update }
    }
}
