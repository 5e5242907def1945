use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewProduct, Product},
    traits::StoreError,
};

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

/// Takes `quantity` units of stock in a single guarded statement. If nothing was updated, the product is looked up
/// again to tell a missing product apart from a short one.
pub async fn reserve_stock(product_id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<Product, StoreError> {
    let product: Option<Product> = sqlx::query_as(
        r#"
        UPDATE products SET stock = stock - $1, updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND stock >= $1
        RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    match product {
        Some(p) => {
            trace!("🗃️ Reserved {quantity} of product {product_id}. {} left", p.stock);
            Ok(p)
        },
        None => match fetch_product(product_id, conn).await? {
            Some(_) => Err(StoreError::InsufficientStock(product_id)),
            None => Err(StoreError::ProductNotFound(product_id)),
        },
    }
}

pub async fn restore_stock(product_id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<Product, StoreError> {
    let product: Option<Product> = sqlx::query_as(
        "UPDATE products SET stock = stock + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(quantity)
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    trace!("🗃️ Restored {quantity} of product {product_id}");
    product.ok_or(StoreError::ProductNotFound(product_id))
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO products (name, price, discount, stock, gram_plastic, exp)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.price)
    .bind(product.discount)
    .bind(product.stock)
    .bind(product.gram_plastic)
    .bind(product.exp)
    .fetch_one(conn)
    .await
}
