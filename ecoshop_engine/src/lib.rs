//! Ecoshop Order Engine
//!
//! The engine turns a cart, or a single product selection, into a persisted order. It reserves inventory, applies
//! voucher discounts under the loyalty-rank rules, picks a manual or gateway payment path and reconciles the payment
//! outcome, accruing loyalty points and telling the customer what happened along the way.
//!
//! The library is divided into three main sections:
//! 1. Backend contracts ([`mod@traits`]) and the SQLite backend that implements them ([`SqliteDatabase`]). Callers
//!    should not need to touch the database directly. The exception is the data types stored in the database, which
//!    live in [`mod@db_types`] and are public.
//! 2. The public API ([`OrderFlowApi`], [`VoucherApi`], [`CartApi`] and [`NotificationApi`]). These hold the business
//!    rules and are generic over the backend traits, so any storage layer implementing the traits can be dropped in.
//! 3. Events ([`mod@events`]). The order flow publishes an event whenever an order is created or changes status.
//!    Subscribers, such as the notification dispatcher, hook into these without being able to affect the flow itself.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

mod eco_api;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use eco_api::{
    cart_api::CartApi,
    errors::{CartError, NotificationError, OrderFlowError, VoucherError},
    notification_api::{parse_order_status, parse_payment_status, NotificationApi, NotificationReceipt, RetryPolicy},
    order_flow_api::{OrderFlowApi, OrderFlowConfig},
    order_objects,
    voucher_api::VoucherApi,
};
