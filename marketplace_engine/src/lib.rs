//! Marketplace Settlement Engine
//!
//! The marketplace engine contains the core logic for a B2B sourcing marketplace: buyers post RFQs, suppliers quote
//! against them, and an accepted quote produces an order whose funds sit in escrow until quality control signs off.
//! This library is provider-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). Currently, Sqlite is the supported backend. You should never
//!    need to access the database directly. Instead, use the public API provided by the engine. The exception is the
//!    data types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@api`]). This provides the public-facing functionality of the engine. It is
//!    responsible for the quote lifecycle, escrow settlement, QC evaluation and authentication. Specific backends
//!    need to implement the traits in the [`mod@traits`] module in order to act as a backend for the marketplace
//!    server.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain actions
//! occur within the engine. For example, when a quote is accepted, a `QuoteAccepted` event is emitted. A simple Actor
//! framework is used so that you can easily hook into these events and perform custom actions.
pub mod api;
pub mod db_types;
pub mod events;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use api::{
    auth_api::AuthApi,
    qc_api::QcApi,
    query_api::QueryApi,
    query_objects,
    quote_flow_api::{DecidedQuote, QuoteFlowApi},
    settlement_api::SettlementApi,
};
pub use traits::{AuthApiError, MarketplaceError, QueryApiError};
