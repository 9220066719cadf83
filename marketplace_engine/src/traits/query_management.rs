use thiserror::Error;

use crate::{
    api::query_objects::{RfqQuotes, TransactionQueryFilter},
    db_types::{EscrowAccount, Order, QcReport, Quote, Rfq, Supplier, Transaction},
};

/// Read-side queries over marketplace entities. This trait carries no mutation and no authorization logic; party
/// checks belong to the APIs built on top of it.
#[allow(async_fn_in_trait)]
pub trait QueryManagement {
    async fn fetch_rfq(&self, rfq_id: i64) -> Result<Option<Rfq>, QueryApiError>;

    async fn fetch_quote(&self, quote_id: i64) -> Result<Option<Quote>, QueryApiError>;

    /// Resolves the supplier profile for a user account, if one exists.
    async fn fetch_supplier_for_user(&self, user_id: i64) -> Result<Option<Supplier>, QueryApiError>;

    async fn fetch_supplier(&self, supplier_id: i64) -> Result<Option<Supplier>, QueryApiError>;

    /// All quotes received by the given buyer, grouped under their RFQs. RFQs without quotes are included with an
    /// empty quote list.
    async fn quotes_for_buyer(&self, buyer_id: i64) -> Result<Vec<RfqQuotes>, QueryApiError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, QueryApiError>;

    /// Orders and transactions are created together, so an order can be looked up by its transaction.
    async fn fetch_order_for_transaction(&self, transaction_id: i64) -> Result<Option<Order>, QueryApiError>;

    async fn fetch_escrow_for_order(&self, order_id: i64) -> Result<Option<EscrowAccount>, QueryApiError>;

    async fn fetch_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, QueryApiError>;

    /// Fetches transactions matching the filter, ordered by `created_at` descending.
    async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, QueryApiError>;

    /// All QC reports for an order, newest first. No pagination.
    async fn qc_reports_for_order(&self, order_id: i64) -> Result<Vec<QcReport>, QueryApiError>;
}

#[derive(Debug, Clone, Error)]
pub enum QueryApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for QueryApiError {
    fn from(e: sqlx::Error) -> Self {
        QueryApiError::DatabaseError(e.to_string())
    }
}
