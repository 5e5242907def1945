use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, NewOrderDetail, Order, OrderCode, OrderDetail, OrderId, OrderStatusType, PaymentStatusType},
    traits::StoreError,
};

/// Inserts the order and its detail lines using the given connection. This is not atomic; run it inside a
/// transaction together with the stock and voucher side effects.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let mut inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                order_code,
                user_id,
                address_id,
                voucher_id,
                note,
                total_gram_plastic,
                total_exp,
                total_quantity,
                grand_total_price,
                shipment_fee,
                admin_fee,
                total_discount,
                total_amount_paid,
                payment_method
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.order_code)
    .bind(order.user_id)
    .bind(order.address_id)
    .bind(order.voucher.map(|v| v.voucher_id))
    .bind(&order.note)
    .bind(order.total_gram_plastic())
    .bind(order.total_exp())
    .bind(order.total_quantity())
    .bind(order.grand_total_price())
    .bind(order.shipment_fee)
    .bind(order.admin_fee)
    .bind(order.voucher_discount())
    .bind(order.total_amount_paid())
    .bind(order.payment_method)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            StoreError::OrderAlreadyExists(order.order_id.clone())
        },
        e => StoreError::from(e),
    })?;
    let mut details = Vec::with_capacity(order.details.len());
    for line in &order.details {
        details.push(insert_detail(&order.order_id, line, &mut *conn).await?);
    }
    inserted.details = details;
    debug!("🗃️ Order {} inserted with {} lines", inserted.order_id, inserted.details.len());
    Ok(inserted)
}

async fn insert_detail(
    order_id: &OrderId,
    line: &NewOrderDetail,
    conn: &mut SqliteConnection,
) -> Result<OrderDetail, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_details (
                order_id,
                product_id,
                quantity,
                total_gram_plastic,
                total_exp,
                total_price,
                total_discount
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .bind(line.total_gram_plastic)
    .bind(line.total_exp)
    .bind(line.total_price)
    .bind(line.total_discount)
    .fetch_one(conn)
    .await
}

/// Returns the order with the given `order_id`, without its detail lines.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await
}

/// Returns the order with the given `order_id` together with its detail lines.
pub async fn fetch_order_with_details(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    match fetch_order_by_order_id(order_id, &mut *conn).await? {
        Some(mut order) => {
            order.details = fetch_details(order_id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

pub async fn fetch_details(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderDetail>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_details WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}

pub async fn order_id_exists(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

pub async fn order_code_exists(code: &OrderCode, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE order_code = $1")
        .bind(code.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Settles the payment of an order that is still awaiting confirmation. Returns `None` if the order does not exist or
/// its payment has already been settled, in which case nothing was changed.
pub async fn settle_payment(
    order_id: &OrderId,
    status: OrderStatusType,
    payment_status: PaymentStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE orders SET status = $1, payment_status = $2, status_updated_at = CURRENT_TIMESTAMP
        WHERE order_id = $3 AND payment_status = $4
        RETURNING *;
        "#,
    )
    .bind(status)
    .bind(payment_status)
    .bind(order_id.as_str())
    .bind(PaymentStatusType::WaitingConfirmation)
    .fetch_optional(conn)
    .await
}

/// Changes the fulfilment status if, and only if, the order is currently in status `from`.
pub async fn update_status(
    order_id: &OrderId,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE orders SET status = $1, status_updated_at = CURRENT_TIMESTAMP
        WHERE order_id = $2 AND status = $3
        RETURNING *;
        "#,
    )
    .bind(to)
    .bind(order_id.as_str())
    .bind(from)
    .fetch_optional(conn)
    .await
}
