use std::sync::Arc;

use ecoshop_engine::{
    db_types::{Order, PaymentStatusType, StatusUpdate},
    events::{EventHandlers, EventHooks, OrderStatusChangedEvent},
    NotificationApi,
    SqliteDatabase,
};
use futures::future::BoxFuture;
use log::*;

use crate::transport::LoggingTransport;

pub type Notifier = NotificationApi<SqliteDatabase, LoggingTransport>;

/// Wires the notification dispatcher into the order flow's events.
///
/// 1. OrderCreatedEvent - the customer is told their order was created and is waiting for payment.
/// 2. OrderStatusChangedEvent - the customer is told about the new payment or fulfilment status.
///
/// Notifications are best-effort. A failure is logged and never reaches the request that caused the event.
pub fn create_notification_event_handlers(api: Notifier, buffer_size: usize) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let api = Arc::new(api);
    let api_clone = Arc::clone(&api);
    // --- On OrderCreated Handler ---
    hooks.on_order_created(move |ev| {
        notify(Arc::clone(&api_clone), ev.order, StatusUpdate::Payment(PaymentStatusType::WaitingConfirmation))
    });
    // --- On OrderStatusChanged Handler ---
    hooks.on_order_status_changed(move |ev| {
        let OrderStatusChangedEvent { order, update } = ev;
        notify(Arc::clone(&api), order, update)
    });
    EventHandlers::new(buffer_size, hooks)
}

fn notify(api: Arc<Notifier>, order: Order, update: StatusUpdate) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        match api.notify(order.user_id, &order.order_id, update).await {
            Ok(receipt) if receipt.delivered => {
                debug!("🔔 Customer {} was told about {update} on {}", order.user_id, order.order_code)
            },
            Ok(_) => debug!("🔔 Notification about {update} on {} was recorded but not delivered", order.order_code),
            Err(e) => error!("🔔 Could not notify customer {} about order {}. {e}", order.user_id, order.order_code),
        }
    })
}
