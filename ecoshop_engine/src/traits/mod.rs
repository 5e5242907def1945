//! # Backend contracts
//!
//! This module defines the behaviour a storage backend must expose to act as a backend for the Ecoshop order engine,
//! along with the two external collaborators the engine talks to but does not implement.
//!
//! ## Storage
//! * [`ProductStock`] reads products and reserves or restores inventory atomically.
//! * [`VoucherManagement`] reads vouchers and records or consumes per-user claims.
//! * [`UserAccounts`] and [`AddressLookup`] read customer data and accrue loyalty points.
//! * [`CartManagement`] mutates carts while keeping the cached grand total honest.
//! * [`OrderManagement`] stores orders and carries out the payment and fulfilment transitions. Every method that
//!   touches more than one table does so in a single transaction.
//! * [`NotificationStore`] keeps a record of every notification sent to a user.
//!
//! The aggregate traits ([`OrderFlowDatabase`], [`VoucherDatabase`], [`CartDatabase`], [`NotificationDatabase`] and
//! [`EcoshopDatabase`]) are blanket-implemented for any type that implements their parts.
//!
//! ## External collaborators
//! * [`PaymentGatewayAdapter`] is the opaque payment gateway.
//! * [`NotificationTransport`] is the opaque push-notification sender.
mod account_management;
mod cart_management;
mod notification_store;
mod order_management;
mod payment_gateway;
mod product_stock;
mod store_error;
mod transport;
mod voucher_management;

pub use account_management::{AddressLookup, UserAccounts};
pub use cart_management::CartManagement;
pub use notification_store::NotificationStore;
pub use order_management::OrderManagement;
pub use payment_gateway::{GatewayError, GatewayInstruction, GatewayStatus, PaymentGatewayAdapter};
pub use product_stock::ProductStock;
pub use store_error::StoreError;
pub use transport::{NotificationTransport, TransportError};
pub use voucher_management::VoucherManagement;

/// Everything the order flow needs from a backend.
pub trait OrderFlowDatabase: OrderManagement + ProductStock + AddressLookup + VoucherManagement + CartManagement {}

impl<T> OrderFlowDatabase for T where
    T: OrderManagement + ProductStock + AddressLookup + VoucherManagement + CartManagement
{
}

/// Everything voucher claims need from a backend.
pub trait VoucherDatabase: VoucherManagement + UserAccounts {}

impl<T> VoucherDatabase for T where T: VoucherManagement + UserAccounts {}

/// Everything cart mutation needs from a backend.
pub trait CartDatabase: CartManagement + ProductStock {}

impl<T> CartDatabase for T where T: CartManagement + ProductStock {}

/// Everything the notification dispatcher needs from a backend.
pub trait NotificationDatabase: NotificationStore + UserAccounts + OrderManagement {}

impl<T> NotificationDatabase for T where T: NotificationStore + UserAccounts + OrderManagement {}

/// The highest level of behaviour for backends supporting the Ecoshop order engine.
#[allow(async_fn_in_trait)]
pub trait EcoshopDatabase: Clone + OrderFlowDatabase + VoucherDatabase + CartDatabase + NotificationDatabase {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Closes the database connection pool.
    async fn close(&mut self) -> Result<(), StoreError>;
}
