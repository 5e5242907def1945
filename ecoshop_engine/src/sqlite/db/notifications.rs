use sqlx::SqliteConnection;

use crate::db_types::{NewNotification, Notification};

pub async fn insert_notification(
    notification: NewNotification,
    conn: &mut SqliteConnection,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as(
        r#"
        INSERT INTO notifications (order_id, user_id, title, body, created_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *;
        "#,
    )
    .bind(notification.order_id)
    .bind(notification.user_id)
    .bind(notification.title)
    .bind(notification.body)
    .bind(notification.created_at)
    .fetch_one(conn)
    .await
}

pub async fn fetch_notifications_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(conn)
        .await
}
