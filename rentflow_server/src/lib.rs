//! # Rentflow server
//! The HTTP and WebSocket front end for the Rentflow reconciliation engine. It is responsible
//! for:
//! * Subscribing to the marketplace contract's event stream and feeding decoded events to the
//!   engine's ingester.
//! * Receiving STK push callbacks from the M-Pesa gateway and applying them to the payment
//!   lifecycle.
//! * Serving payment and notification queries to clients, and pushing real-time frames over
//!   WebSocket to identified clients.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.

pub mod chain_worker;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod routes;
pub mod server;
pub mod ws;
