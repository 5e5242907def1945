use crate::{
    db_types::{NewNotification, Notification},
    traits::StoreError,
};

#[allow(async_fn_in_trait)]
pub trait NotificationStore {
    async fn record_notification(&self, notification: NewNotification) -> Result<Notification, StoreError>;

    /// The user's notifications, newest first.
    async fn fetch_notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>, StoreError>;
}
