//! Rentflow Engine
//!
//! The reconciliation core for the Rentflow rental marketplace. It folds two unreliable inbound
//! streams into one consistent datastore and notifies the affected parties:
//! 1. On-chain marketplace events (listings, agreements, payments, deposit releases), delivered
//!    at-least-once by a chain node subscription. See [`EventIngester`].
//! 2. Mobile-money payment callbacks, delivered late, duplicated or never by the M-Pesa gateway.
//!    See [`PaymentGateway`].
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. You should
//!    never need to access the database directly; use the public API instead. The exception is the
//!    data types stored in the database, which are defined in [`db_types`] and are public.
//! 2. The engine public API ([`mod@rfe_api`]). Each API struct is generic over the datastore
//!    traits it needs, so a backend only has to implement the traits in [`traits`] to power the
//!    Rentflow server.
//!
//! Every write path is idempotent. Chain events and gateway callbacks may be replayed arbitrarily,
//! and the datastore absorbs the duplicates without emitting duplicate notifications.
mod db;

pub mod db_types;
pub mod events;
pub mod live;
pub mod rfe_api;

pub use db::{
    common::{InsertAgreementResult, InsertPaymentResult, SettlementResult, UpsertPropertyResult},
    traits,
};
#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use rfe_api::{
    CallbackOutcome,
    CallbackResult,
    CallbackStatus,
    EventIngester,
    NotificationHub,
    PaymentGateway,
    ProviderError,
    PushPaymentProvider,
    PushPaymentRequest,
    ReconciliationError,
};
pub use db::traits::{ChainEventDatabase, NotificationManagement, PaymentManagement};
