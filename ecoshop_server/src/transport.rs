use ecoshop_engine::traits::{NotificationTransport, TransportError};
use log::*;

/// A push transport that writes every notification to the log instead of sending it to a device.
///
/// Stand-in for a real push provider. Swap it for a provider-backed [`NotificationTransport`] to reach devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingTransport;

impl NotificationTransport for LoggingTransport {
    async fn send(&self, user_id: i64, device_token: &str, title: &str, body: &str) -> Result<(), TransportError> {
        if device_token.trim().is_empty() {
            return Err(TransportError("empty device token".into()));
        }
        info!("📱️ Push to user {user_id}: [{title}] {body}");
        Ok(())
    }
}
