//! A client for the Safaricom Daraja (M-Pesa) API.
//!
//! This crate covers the two halves of an STK push payment:
//! 1. The outbound initiation request ([`MpesaApi::initiate_stk_push`]), which authenticates with
//!    a cached OAuth token and asks Daraja to display a payment prompt on the customer's phone.
//! 2. The inbound callback payload ([`StkCallbackDocument`]), which Daraja POSTs to the configured
//!    callback URL zero or more times. [`StkCallbackDocument::summarize`] flattens it into a
//!    [`CallbackSummary`], extracting metadata items by name.
//!
//! The crate knows nothing about the payment database; correlating callbacks with pending
//! payments is the caller's job.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::MpesaApi;
pub use config::MpesaConfig;
pub use data_objects::{
    CallbackSummary,
    StkCallback,
    StkCallbackDocument,
    StkPushRequest,
    StkPushResponse,
};
pub use error::MpesaApiError;
