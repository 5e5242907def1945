use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Notification transport failure: {0}")]
pub struct TransportError(pub String);

/// The push-notification sender.
#[allow(async_fn_in_trait)]
pub trait NotificationTransport {
    async fn send(&self, user_id: i64, device_token: &str, title: &str, body: &str) -> Result<(), TransportError>;
}
