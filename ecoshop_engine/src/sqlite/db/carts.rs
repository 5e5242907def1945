use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Cart, CartItem, Product, Rupiah},
    traits::StoreError,
};

pub async fn fetch_cart_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    let cart: Option<Cart> =
        sqlx::query_as("SELECT * FROM carts WHERE user_id = $1").bind(user_id).fetch_optional(&mut *conn).await?;
    match cart {
        Some(mut cart) => {
            cart.items = fetch_items(cart.id, conn).await?;
            Ok(Some(cart))
        },
        None => Ok(None),
    }
}

/// Returns the id of the user's cart, creating an empty cart if necessary.
///
/// Always writes, so a transaction that starts with this call holds the write lock before it reads anything.
pub async fn ensure_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    trace!("🗃️ Ensuring cart for user {user_id}");
    sqlx::query_scalar(
        r#"
        INSERT INTO carts (user_id) VALUES ($1)
        ON CONFLICT (user_id) DO UPDATE SET updated_at = CURRENT_TIMESTAMP
        RETURNING id
        "#,
    )
    .bind(user_id)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_foreign_key_violation() => StoreError::UserNotFound(user_id),
        e => StoreError::from(e),
    })
}

/// Returns the user's cart, creating an empty one if necessary.
pub async fn fetch_or_create_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<Cart, StoreError> {
    ensure_cart(user_id, &mut *conn).await?;
    fetch_cart_for_user(user_id, conn).await?.ok_or(StoreError::UserNotFound(user_id))
}

/// Touches the user's cart row, if there is one, so that the calling transaction holds the write lock from here on.
pub async fn lock_cart(user_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE carts SET updated_at = CURRENT_TIMESTAMP WHERE user_id = $1")
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_items(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 ORDER BY id").bind(cart_id).fetch_all(conn).await
}

/// Fetches the cart item, but only if it sits in the given user's cart.
pub async fn fetch_item_for_user(
    user_id: i64,
    item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT cart_items.* FROM cart_items
        JOIN carts ON carts.id = cart_items.cart_id
        WHERE carts.user_id = $1 AND cart_items.id = $2
        "#,
    )
    .bind(user_id)
    .bind(item_id)
    .fetch_optional(conn)
    .await
}

async fn fetch_item_for_product(
    cart_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(conn)
        .await
}

/// Adds `quantity` units of `product` to the cart, merging with the existing line for that product if there is one.
/// The line is repriced at the product's current unit price. The merged quantity may not exceed the product's stock.
pub async fn add_item(
    cart_id: i64,
    product: &Product,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, StoreError> {
    let existing = fetch_item_for_product(cart_id, product.id, &mut *conn).await?;
    let new_quantity = match &existing {
        Some(item) => item.quantity.checked_add(quantity),
        None => Some(quantity),
    }
    .filter(|q| *q <= product.stock)
    .ok_or(StoreError::InsufficientStock(product.id))?;
    match existing {
        Some(item) => set_quantity(&item, product.unit_price(), new_quantity, conn).await,
        None => {
            let total_price = line_total(product.id, product.unit_price(), new_quantity)?;
            let item = sqlx::query_as(
                r#"INSERT INTO cart_items (cart_id, product_id, quantity, total_price)
                VALUES ($1, $2, $3, $4) RETURNING *"#,
            )
            .bind(cart_id)
            .bind(product.id)
            .bind(new_quantity)
            .bind(total_price)
            .fetch_one(conn)
            .await?;
            Ok(item)
        },
    }
}

pub async fn set_quantity(
    item: &CartItem,
    unit_price: Rupiah,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, StoreError> {
    let total_price = line_total(item.product_id, unit_price, quantity)?;
    let item = sqlx::query_as("UPDATE cart_items SET quantity = $1, total_price = $2 WHERE id = $3 RETURNING *")
        .bind(quantity)
        .bind(total_price)
        .bind(item.id)
        .fetch_one(conn)
        .await?;
    Ok(item)
}

fn line_total(product_id: i64, unit_price: Rupiah, quantity: i64) -> Result<Rupiah, StoreError> {
    unit_price.checked_mul(quantity).ok_or(StoreError::LineTotalOutOfRange { product_id, quantity })
}

/// Takes `quantity` units off the line, deleting it if it reaches zero. Returns the remaining line, if any.
pub async fn reduce_item(
    item: &CartItem,
    unit_price: Rupiah,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, StoreError> {
    if quantity > item.quantity {
        let available = item.quantity;
        return Err(StoreError::CartQuantityExceeded { item_id: item.id, requested: quantity, available });
    }
    if quantity == item.quantity {
        delete_item(item.id, conn).await?;
        return Ok(None);
    }
    let item = set_quantity(item, unit_price, item.quantity - quantity, conn).await?;
    Ok(Some(item))
}

pub async fn delete_item(item_id: i64, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1").bind(item_id).execute(conn).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::CartItemNotFound(item_id));
    }
    Ok(())
}

/// Deletes the cart item if it sits in the given user's cart, returning the deleted line.
pub async fn take_item_for_user(
    user_id: i64,
    item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    sqlx::query_as(
        r#"
        DELETE FROM cart_items
        WHERE id = $1 AND cart_id IN (SELECT id FROM carts WHERE user_id = $2)
        RETURNING *
        "#,
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// Removes the product from the user's cart, if it is there. Returns whether a line was removed.
pub async fn remove_product_for_user(
    user_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM cart_items
        WHERE product_id = $1 AND cart_id IN (SELECT id FROM carts WHERE user_id = $2)
        "#,
    )
    .bind(product_id)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Recomputes the cached grand total of the user's cart from its items.
pub async fn refresh_grand_total_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE carts SET
            grand_total = (SELECT COALESCE(SUM(total_price), 0) FROM cart_items WHERE cart_items.cart_id = carts.id),
            updated_at = CURRENT_TIMESTAMP
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(())
}
