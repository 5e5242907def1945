use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use ecoshop_engine::{CartError, NotificationError, OrderFlowError, VoucherError};
use log::*;
use thiserror::Error;

/// Errors returned by the route handlers.
///
/// Customer-facing variants carry the engine's message unchanged, so the `{"error": ...}` body a client sees is the
/// same text the engine produced. Internal failures are logged in full where they are mapped and reach the client
/// with the short message only.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("{0}")]
    BackendError(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("{0}")]
    NoRecordFound(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    InsufficientPermissions(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    GatewayError(String),
    #[error("{0}")]
    GatewayTimeout(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        use OrderFlowError::*;
        let msg = e.to_string();
        match e {
            AddressNotFound(_) | VoucherNotFound(_) | ProductNotFound(_) | CartItemNotFound(_) | OrderNotFound(_) => {
                Self::NoRecordFound(msg)
            },
            VoucherNotRedeemable(_) |
            VoucherNotClaimed(_) |
            InvalidPaymentMethod(_) |
            InvalidQuantity(_) |
            EmptyOrder |
            InvalidCallbackPayload(_) => Self::InvalidRequest(msg),
            InsufficientStock(_) | PaymentAlreadySettled(..) | ForbiddenStatusChange { .. } => Self::Conflict(msg),
            Gateway(e) => {
                warn!("💻️ Payment gateway error. {e}");
                Self::GatewayError(msg)
            },
            GatewayTimeout(order_id) => {
                warn!("💻️ Payment gateway timed out for order {order_id}");
                Self::GatewayTimeout(msg)
            },
            OrderIdGeneration(e) | OrderCodeGeneration(e) | Backend { source: e, .. } => {
                error!("💻️ {msg}. {e}");
                Self::BackendError(msg)
            },
        }
    }
}

impl From<VoucherError> for ServerError {
    fn from(e: VoucherError) -> Self {
        let msg = e.to_string();
        match e {
            VoucherError::VoucherNotFound(_) | VoucherError::UserNotFound(_) => Self::NoRecordFound(msg),
            VoucherError::NotRedeemable(_) => Self::InvalidRequest(msg),
            VoucherError::OutOfStock(_) | VoucherError::AlreadyClaimed(_) => Self::Conflict(msg),
            VoucherError::LevelTooLow { .. } => Self::InsufficientPermissions(msg),
            VoucherError::Backend(e) => {
                error!("💻️ {msg}. {e}");
                Self::BackendError(msg)
            },
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        let msg = e.to_string();
        match e {
            CartError::ProductNotFound(_) | CartError::CartItemNotFound(_) | CartError::UserNotFound(_) => {
                Self::NoRecordFound(msg)
            },
            CartError::InvalidQuantity(_) | CartError::QuantityExceedsCart { .. } => Self::InvalidRequest(msg),
            CartError::InsufficientStock(_) => Self::Conflict(msg),
            CartError::Backend(e) => {
                error!("💻️ {msg}. {e}");
                Self::BackendError(msg)
            },
        }
    }
}

impl From<NotificationError> for ServerError {
    fn from(e: NotificationError) -> Self {
        let msg = e.to_string();
        match e {
            NotificationError::InvalidPaymentStatus(_) | NotificationError::InvalidOrderStatus(_) => {
                Self::InvalidRequest(msg)
            },
            NotificationError::UserNotFound(_) | NotificationError::OrderNotFound(_) => Self::NoRecordFound(msg),
            NotificationError::Backend(e) => {
                error!("💻️ {msg}. {e}");
                Self::BackendError(msg)
            },
        }
    }
}
