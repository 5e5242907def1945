use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewVoucher, Voucher, VoucherClaim},
    traits::StoreError,
};

pub async fn fetch_voucher(voucher_id: i64, conn: &mut SqliteConnection) -> Result<Option<Voucher>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM vouchers WHERE id = $1").bind(voucher_id).fetch_optional(conn).await
}

pub async fn fetch_claim(
    user_id: i64,
    voucher_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<VoucherClaim>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM voucher_claims WHERE user_id = $1 AND voucher_id = $2")
        .bind(user_id)
        .bind(voucher_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_claims_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<VoucherClaim>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM voucher_claims WHERE user_id = $1 ORDER BY created_at, id")
        .bind(user_id)
        .fetch_all(conn)
        .await
}

/// Takes one unit of stock from the voucher, provided there is any left.
pub async fn take_stock(voucher_id: i64, conn: &mut SqliteConnection) -> Result<Voucher, StoreError> {
    let voucher: Option<Voucher> =
        sqlx::query_as("UPDATE vouchers SET stock = stock - 1 WHERE id = $1 AND stock > 0 RETURNING *")
            .bind(voucher_id)
            .fetch_optional(&mut *conn)
            .await?;
    match voucher {
        Some(v) => Ok(v),
        None => match fetch_voucher(voucher_id, conn).await? {
            Some(_) => Err(StoreError::VoucherOutOfStock(voucher_id)),
            None => Err(StoreError::VoucherNotFound(voucher_id)),
        },
    }
}

pub async fn insert_claim(
    user_id: i64,
    voucher_id: i64,
    claimed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<VoucherClaim, StoreError> {
    sqlx::query_as("INSERT INTO voucher_claims (user_id, voucher_id, created_at) VALUES ($1, $2, $3) RETURNING *")
        .bind(user_id)
        .bind(voucher_id)
        .bind(claimed_at)
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => {
                StoreError::VoucherAlreadyClaimed { user_id, voucher_id }
            },
            e => StoreError::from(e),
        })
}

/// Consumes the user's claim on the voucher. A claim can only be used once.
pub async fn consume_claim(user_id: i64, voucher_id: i64, conn: &mut SqliteConnection) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM voucher_claims WHERE user_id = $1 AND voucher_id = $2")
        .bind(user_id)
        .bind(voucher_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::VoucherNotClaimed { user_id, voucher_id });
    }
    Ok(())
}

pub async fn insert_voucher(voucher: NewVoucher, conn: &mut SqliteConnection) -> Result<Voucher, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO vouchers (name, discount, min_purchase, stock, category, status, start_date, end_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *;
        "#,
    )
    .bind(voucher.name)
    .bind(voucher.discount)
    .bind(voucher.min_purchase)
    .bind(voucher.stock)
    .bind(voucher.category)
    .bind(voucher.status)
    .bind(voucher.start_date)
    .bind(voucher.end_date)
    .fetch_one(conn)
    .await
}
