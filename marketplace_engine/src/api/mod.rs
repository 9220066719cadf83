//! # Marketplace engine public API
//!
//! The `api` module exposes the programmatic API for the marketplace engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//! Or different parts (e.g. auth and settlement) could be configured on different machines, or even use Sqlite for one
//! and Postgres for the other.
//!
//! * [`quote_flow_api`] is the primary API for the RFQ and quote lifecycle, from quote submission through to buyer
//!   decisions.
//! * [`qc_api`] records quality-control inspection reports and drives the settlement or dispute that follows from a
//!   verdict.
//! * [`settlement_api`] provides escrow release and transaction queries.
//! * [`query_api`] provides read-only access to RFQs, quotes, orders and reports.
//! * [`auth_api`] manages nonce state for authentication tokens, and managing user [`crate::db_types::Role`]s.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! For example, to create an API instance to query the quotes on the database:
//!
//! ```rust,ignore
//! use marketplace_engine::{QueryApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements QueryManagement
//! let api = QueryApi::new(db);
//! // use the api to access information
//! let dashboard = api.quotes_for_buyer(buyer_id).await?;
//! ```

pub mod auth_api;
pub mod qc_api;
pub mod query_api;
pub mod query_objects;
pub mod quote_flow_api;
pub mod settlement_api;
