//! # Ecoshop engine public API
//!
//! The API is modular, so that clients can pick the parts they need:
//!
//! * [`order_flow_api`] places orders and reconciles their payments, manual or gateway.
//! * [`voucher_api`] decides who may claim which voucher and records the claims.
//! * [`cart_api`] mutates carts.
//! * [`notification_api`] tells customers about status changes.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the backend traits it needs:
//!
//! ```rust,ignore
//! use ecoshop_engine::{SqliteDatabase, VoucherApi};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements VoucherManagement and UserAccounts
//! let api = VoucherApi::new(db);
//! let claim = api.claim_voucher(user_id, voucher_id).await?;
//! ```
pub mod cart_api;
pub mod errors;
pub mod notification_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod voucher_api;
