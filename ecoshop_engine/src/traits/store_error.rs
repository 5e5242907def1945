use thiserror::Error;

use crate::db_types::{OrderId, OrderStatusType, PaymentStatusType};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Product {0} does not have enough stock")]
    InsufficientStock(i64),
    #[error("Voucher {0} does not exist")]
    VoucherNotFound(i64),
    #[error("Voucher {0} has no stock left")]
    VoucherOutOfStock(i64),
    #[error("User {user_id} has already claimed voucher {voucher_id}")]
    VoucherAlreadyClaimed { user_id: i64, voucher_id: i64 },
    #[error("User {user_id} does not hold a claim for voucher {voucher_id}")]
    VoucherNotClaimed { user_id: i64, voucher_id: i64 },
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Cart item {0} does not exist")]
    CartItemNotFound(i64),
    #[error("The price of {quantity} units of product {product_id} is out of range")]
    LineTotalOutOfRange { product_id: i64, quantity: i64 },
    #[error("Cannot remove {requested} units from cart item {item_id}, which only holds {available}")]
    CartQuantityExceeded { item_id: i64, requested: i64, available: i64 },
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The payment for order {0} has already been settled as {1}")]
    PaymentAlreadySettled(OrderId, PaymentStatusType),
    #[error("Order {order_id} cannot move from {from} to {to}")]
    ForbiddenStatusChange { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
