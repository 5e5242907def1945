use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use ecoshop_engine::{
    db_types::{OrderId, OrderStatusType, PaymentMethod, PaymentStatusType, Rupiah},
    traits::{
        GatewayError,
        GatewayInstruction,
        GatewayStatus,
        NotificationTransport,
        PaymentGatewayAdapter,
        TransportError,
    },
};
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayBehaviour {
    Accept,
    Reject,
    Hang,
}

#[derive(Debug)]
struct GatewayState {
    behaviour: GatewayBehaviour,
    status: GatewayStatus,
    processed: Vec<(OrderId, Rupiah, PaymentMethod)>,
    status_checks: usize,
}

/// A scriptable payment gateway.
#[derive(Debug, Clone)]
pub struct FakeGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        let status = GatewayStatus {
            order_status: OrderStatusType::WaitingConfirmation,
            payment_status: PaymentStatusType::WaitingConfirmation,
        };
        let state = GatewayState { behaviour: GatewayBehaviour::Accept, status, processed: vec![], status_checks: 0 };
        Self { state: Arc::new(Mutex::new(state)) }
    }
}

impl FakeGateway {
    pub fn with_behaviour(behaviour: GatewayBehaviour) -> Self {
        let gateway = Self::default();
        gateway.state.lock().unwrap().behaviour = behaviour;
        gateway
    }

    pub fn settle_as(&self, order_status: OrderStatusType, payment_status: PaymentStatusType) {
        self.state.lock().unwrap().status = GatewayStatus { order_status, payment_status };
    }

    pub fn processed(&self) -> Vec<(OrderId, Rupiah, PaymentMethod)> {
        self.state.lock().unwrap().processed.clone()
    }

    pub fn status_checks(&self) -> usize {
        self.state.lock().unwrap().status_checks
    }
}

impl PaymentGatewayAdapter for FakeGateway {
    async fn process(
        &self,
        amount: Rupiah,
        order_id: &OrderId,
        method: PaymentMethod,
    ) -> Result<GatewayInstruction, GatewayError> {
        let behaviour = {
            let mut state = self.state.lock().unwrap();
            state.processed.push((order_id.clone(), amount, method));
            state.behaviour
        };
        match behaviour {
            GatewayBehaviour::Accept => {
                Ok(GatewayInstruction(json!({ "qr_string": format!("QR-{}-{}", order_id.as_str(), amount.value()) })))
            },
            GatewayBehaviour::Reject => Err(GatewayError::Rejected("insufficient balance".into())),
            GatewayBehaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::Unavailable("hung".into()))
            },
        }
    }

    async fn check_status(&self, _order_id: &OrderId) -> Result<GatewayStatus, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.status_checks += 1;
        Ok(state.status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPush {
    pub user_id: i64,
    pub device_token: String,
    pub title: String,
    pub body: String,
}

/// A notification transport that records what it was asked to send, and can be made to fail a number of times first.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentPush>>>,
    failures_left: Arc<AtomicU32>,
    attempts: Arc<AtomicU32>,
}

impl RecordingTransport {
    pub fn failing(times: u32) -> Self {
        let transport = Self::default();
        transport.failures_left.store(times, Ordering::SeqCst);
        transport
    }

    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl NotificationTransport for RecordingTransport {
    async fn send(&self, user_id: i64, device_token: &str, title: &str, body: &str) -> Result<(), TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failures_left = self.failures_left.load(Ordering::SeqCst);
        if failures_left > 0 {
            self.failures_left.store(failures_left - 1, Ordering::SeqCst);
            return Err(TransportError("device unreachable".into()));
        }
        let push = SentPush {
            user_id,
            device_token: device_token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        };
        self.sent.lock().unwrap().push(push);
        Ok(())
    }
}
