use sqlx::SqliteConnection;

use crate::{
    db_types::{Address, NewAddress, NewUser, User},
    traits::StoreError,
};

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await
}

pub async fn accrue_loyalty(
    user_id: i64,
    exp: i64,
    gram_plastic: i64,
    conn: &mut SqliteConnection,
) -> Result<User, StoreError> {
    let user: Option<User> = sqlx::query_as(
        r#"
        UPDATE users SET exp = exp + $1, total_gram = total_gram + $2, updated_at = CURRENT_TIMESTAMP
        WHERE id = $3
        RETURNING *;
        "#,
    )
    .bind(exp)
    .bind(gram_plastic)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    user.ok_or(StoreError::UserNotFound(user_id))
}

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    sqlx::query_as("INSERT INTO users (name, email, level, device_token) VALUES ($1, $2, $3, $4) RETURNING *")
        .bind(user.name)
        .bind(user.email)
        .bind(user.level)
        .bind(user.device_token)
        .fetch_one(conn)
        .await
}

pub async fn fetch_address(address_id: i64, conn: &mut SqliteConnection) -> Result<Option<Address>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM addresses WHERE id = $1").bind(address_id).fetch_optional(conn).await
}

pub async fn insert_address(address: NewAddress, conn: &mut SqliteConnection) -> Result<Address, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO addresses (user_id, recipient_name, phone, full_address)
        VALUES ($1, $2, $3, $4)
        RETURNING *;
        "#,
    )
    .bind(address.user_id)
    .bind(address.recipient_name)
    .bind(address.phone)
    .bind(address.full_address)
    .fetch_one(conn)
    .await
}
