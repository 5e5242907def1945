//! A sandbox payment gateway.
//!
//! The engine treats the payment gateway as an opaque adapter. Until a real provider is wired in, the server runs
//! against this sandbox: it hands out a fake payment code for every gateway payment it is asked to process, and
//! resolves status checks for those payments according to [`SandboxSettlement`].
use std::{collections::HashMap, fmt::Display, str::FromStr, sync::Arc};

use chrono::{DateTime, Utc};
use ecoshop_engine::{
    db_types::{OrderId, OrderStatusType, PaymentMethod, PaymentStatusType, Rupiah},
    traits::{GatewayError, GatewayInstruction, GatewayStatus, PaymentGatewayAdapter},
};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde_json::json;
use tokio::sync::RwLock;

/// How the sandbox resolves the payments it has processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SandboxSettlement {
    /// Payments never settle. Every callback leaves the order waiting.
    Pending,
    /// Every payment succeeds.
    #[default]
    Confirm,
    /// Every payment fails.
    Fail,
}

impl Display for SandboxSettlement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirm => write!(f, "confirm"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl FromStr for SandboxSettlement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirm" => Ok(Self::Confirm),
            "fail" => Ok(Self::Fail),
            _ => Err(format!("Expected one of pending, confirm or fail, but got '{s}'.")),
        }
    }
}

impl SandboxSettlement {
    fn status(&self) -> GatewayStatus {
        match self {
            Self::Pending => GatewayStatus {
                order_status: OrderStatusType::WaitingConfirmation,
                payment_status: PaymentStatusType::WaitingConfirmation,
            },
            Self::Confirm => GatewayStatus {
                order_status: OrderStatusType::Processing,
                payment_status: PaymentStatusType::Confirmed,
            },
            Self::Fail => {
                GatewayStatus { order_status: OrderStatusType::Failed, payment_status: PaymentStatusType::Failed }
            },
        }
    }
}

#[derive(Debug, Clone)]
struct SandboxPayment {
    amount: Rupiah,
    method: PaymentMethod,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SandboxGateway {
    settlement: SandboxSettlement,
    payments: Arc<RwLock<HashMap<OrderId, SandboxPayment>>>,
}

impl SandboxGateway {
    pub fn new(settlement: SandboxSettlement) -> Self {
        Self { settlement, payments: Arc::new(RwLock::new(HashMap::new())) }
    }

    fn payment_code() -> String {
        let code: String = thread_rng().sample_iter(&Alphanumeric).take(12).map(char::from).collect();
        format!("SBX-{}", code.to_uppercase())
    }
}

impl PaymentGatewayAdapter for SandboxGateway {
    async fn process(
        &self,
        amount: Rupiah,
        order_id: &OrderId,
        method: PaymentMethod,
    ) -> Result<GatewayInstruction, GatewayError> {
        if !method.is_gateway() {
            return Err(GatewayError::UnsupportedMethod(method));
        }
        let payment = SandboxPayment { amount, method, created_at: Utc::now() };
        let payment_code = Self::payment_code();
        let instruction = json!({
            "gateway": "sandbox",
            "payment_method": method,
            "amount": amount,
            "payment_code": payment_code,
            "created_at": payment.created_at,
        });
        self.payments.write().await.insert(order_id.clone(), payment);
        debug!("💳️ Sandbox payment {payment_code} of {amount} via {method} opened for order {order_id}");
        Ok(GatewayInstruction(instruction))
    }

    /// Settled payments are forgotten once reported. Pending ones stay open for the next check.
    async fn check_status(&self, order_id: &OrderId) -> Result<GatewayStatus, GatewayError> {
        let mut payments = self.payments.write().await;
        let payment = match self.settlement {
            SandboxSettlement::Pending => payments.get(order_id).cloned(),
            SandboxSettlement::Confirm | SandboxSettlement::Fail => payments.remove(order_id),
        }
        .ok_or_else(|| GatewayError::UnknownOrder(order_id.clone()))?;
        debug!(
            "💳️ Sandbox settles the {} payment of {} for order {order_id} as {}",
            payment.method, payment.amount, self.settlement
        );
        Ok(self.settlement.status())
    }
}
