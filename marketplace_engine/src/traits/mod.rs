//! Database backend contracts for the marketplace settlement engine.
//!
//! These traits define what a storage backend must provide in order to drive the settlement flows. The engine's
//! public APIs are generic over them, so backends can be swapped (or mocked in tests) without touching flow logic.
//!
//! * [`MarketplaceDatabase`] is the highest-level contract: the mutating flows (quote lifecycle, escrow ledger,
//!   QC state machine) with their atomicity guarantees.
//! * [`QueryManagement`] provides the read side: entity lookups, party resolution and transaction search.
//! * [`AuthManagement`] covers credentials, nonce replay protection and role management.

mod auth_management;
mod marketplace_database;
mod query_management;

pub use auth_management::{AuthApiError, AuthManagement};
pub use marketplace_database::{MarketplaceDatabase, MarketplaceError};
pub use query_management::{QueryApiError, QueryManagement};
