//! Customer notifications for order and payment status changes.
//!
//! Every status has a fixed Indonesian template that names the customer and the order code. Push delivery goes through
//! the [`NotificationTransport`] with bounded retries; the notification record is stored whether or not the push
//! got through, so the in-app inbox is complete even for users without a registered device.
use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewNotification, Notification, OrderCode, OrderId, OrderStatusType, PaymentStatusType, StatusUpdate},
    eco_api::errors::NotificationError,
    traits::{NotificationDatabase, NotificationTransport, TransportError},
};

/// Parses a payment status, as used by the notification endpoints. Unknown statuses are rejected before anything is
/// sent or stored.
pub fn parse_payment_status(status: &str) -> Result<PaymentStatusType, NotificationError> {
    status.parse().map_err(|_| NotificationError::InvalidPaymentStatus(status.to_string()))
}

/// Parses a fulfilment status, as used by the notification endpoints.
pub fn parse_order_status(status: &str) -> Result<OrderStatusType, NotificationError> {
    status.parse().map_err(|_| NotificationError::InvalidOrderStatus(status.to_string()))
}

/// Bounded retries with exponential backoff. The first retry waits `initial_backoff`, and every later one waits twice as
/// long as the one before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, initial_backoff: Duration::from_millis(250) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), initial_backoff }
    }

    /// The wait before retry number `retry` (counting from zero).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReceipt {
    pub notification: Notification,
    /// Whether the push notification reached the transport. `false` if the user has no device or every attempt failed.
    pub delivered: bool,
}

pub struct NotificationApi<B, T> {
    db: B,
    transport: T,
    retry: RetryPolicy,
}

impl<B, T> Debug for NotificationApi<B, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi ({:?})", self.retry)
    }
}

impl<B, T> NotificationApi<B, T>
where
    B: NotificationDatabase,
    T: NotificationTransport,
{
    pub fn new(db: B, transport: T, retry: RetryPolicy) -> Self {
        Self { db, transport, retry }
    }

    pub async fn notify_payment_status(
        &self,
        user_id: i64,
        order_id: &OrderId,
        status: &str,
    ) -> Result<NotificationReceipt, NotificationError> {
        let status = parse_payment_status(status)?;
        self.notify(user_id, order_id, StatusUpdate::Payment(status)).await
    }

    pub async fn notify_order_status(
        &self,
        user_id: i64,
        order_id: &OrderId,
        status: &str,
    ) -> Result<NotificationReceipt, NotificationError> {
        let status = parse_order_status(status)?;
        self.notify(user_id, order_id, StatusUpdate::Order(status)).await
    }

    /// Tells the user about a status change on one of their orders, and records the notification.
    pub async fn notify(
        &self,
        user_id: i64,
        order_id: &OrderId,
        update: StatusUpdate,
    ) -> Result<NotificationReceipt, NotificationError> {
        let user = self.db.fetch_user(user_id).await?.ok_or(NotificationError::UserNotFound(user_id))?;
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| NotificationError::OrderNotFound(order_id.clone()))?;
        let (title, body) = render_template(update, &user.name, &order.order_code);
        let delivered = match user.device_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => match self.send_with_retries(user_id, token, &title, &body).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("🔔 Could not deliver '{title}' to user {user_id}: {e}. The notification is still recorded.");
                    false
                },
            },
            None => {
                debug!("🔔 User {user_id} has no device token. Only recording the notification.");
                false
            },
        };
        let record = NewNotification { order_id: order_id.clone(), user_id, title, body, created_at: Utc::now() };
        let notification = self.db.record_notification(record).await?;
        info!("🔔 Notified user {user_id} about {update} on order {}", order.order_code);
        Ok(NotificationReceipt { notification, delivered })
    }

    pub async fn fetch_notifications_for_user(&self, user_id: i64) -> Result<Vec<Notification>, NotificationError> {
        let notifications = self.db.fetch_notifications_for_user(user_id).await?;
        Ok(notifications)
    }

    async fn send_with_retries(
        &self,
        user_id: i64,
        token: &str,
        title: &str,
        body: &str,
    ) -> Result<(), TransportError> {
        let mut retry = 0;
        loop {
            match self.transport.send(user_id, token, title, body).await {
                Ok(()) => return Ok(()),
                Err(e) if retry + 1 >= self.retry.max_attempts => return Err(e),
                Err(e) => {
                    let wait = self.retry.backoff(retry);
                    debug!("🔔 Push to user {user_id} failed ({e}). Retrying in {wait:?}");
                    tokio::time::sleep(wait).await;
                    retry += 1;
                },
            }
        }
    }
}

fn render_template(update: StatusUpdate, name: &str, code: &OrderCode) -> (String, String) {
    let (title, body) = match update {
        StatusUpdate::Payment(PaymentStatusType::WaitingConfirmation) => (
            "Pesanan Berhasil Dibuat",
            format!("Hai {name}, pesanan {code} berhasil dibuat. Segera selesaikan pembayaran agar pesananmu diproses."),
        ),
        StatusUpdate::Payment(PaymentStatusType::Confirmed) => (
            "Pembayaran Dikonfirmasi",
            format!("Hai {name}, pembayaran untuk pesanan {code} telah dikonfirmasi. Terima kasih sudah berbelanja!"),
        ),
        StatusUpdate::Payment(PaymentStatusType::Failed) => (
            "Pembayaran Gagal",
            format!("Hai {name}, pembayaran untuk pesanan {code} gagal atau dibatalkan."),
        ),
        StatusUpdate::Order(OrderStatusType::WaitingConfirmation) => (
            "Pesanan Menunggu Konfirmasi",
            format!("Hai {name}, pesanan {code} sedang menunggu konfirmasi pembayaran."),
        ),
        StatusUpdate::Order(OrderStatusType::Processing) => {
            ("Pesanan Diproses", format!("Hai {name}, pesanan {code} sedang diproses."))
        },
        StatusUpdate::Order(OrderStatusType::Shipping) => {
            ("Pesanan Dikirim", format!("Hai {name}, pesanan {code} sedang dalam perjalanan ke alamatmu."))
        },
        StatusUpdate::Order(OrderStatusType::Completed) => (
            "Pesanan Selesai",
            format!("Hai {name}, pesanan {code} telah selesai. Terima kasih sudah ikut mengurangi sampah plastik!"),
        ),
        StatusUpdate::Order(OrderStatusType::Failed) => {
            ("Pesanan Gagal", format!("Hai {name}, pesanan {code} gagal diproses."))
        },
    };
    (title.to_string(), body)
}
