//! # Ecoshop server
//! This crate hosts the HTTP surface of the Ecoshop order engine. It is responsible for:
//! * Accepting order placements, from a single product or from a selection of cart items.
//! * Payment confirmation and cancellation of manual payments.
//! * Receiving payment gateway callbacks, which are verified with an HMAC signature before being reconciled.
//! * Voucher claims, cart mutation and order fulfilment progression.
//! * Dispatching notifications to customers whenever an order is created or changes status.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: The order, voucher, cart and notification routes. See [routes](routes/index.html).
//! * `/payment/callback`: The payment gateway callback route.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod gateway;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod transport;

#[cfg(test)]
mod endpoint_tests;
