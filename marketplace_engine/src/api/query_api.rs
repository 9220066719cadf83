//! Unified read-only access to marketplace entities.

use std::fmt::Debug;

use crate::{
    api::query_objects::{RfqQuotes, TransactionQueryFilter},
    db_types::{EscrowAccount, Order, QcReport, Quote, Rfq, Supplier, Transaction},
    traits::{QueryApiError, QueryManagement},
};

/// The `QueryApi` provides a unified read-only API over marketplace entities.
pub struct QueryApi<B> {
    db: B,
}

impl<B: Debug> Debug for QueryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QueryApi ({:?})", self.db)
    }
}

impl<B> QueryApi<B>
where B: QueryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Fetches the RFQ with the given id. If no RFQ exists, `None` is returned.
    pub async fn rfq_by_id(&self, rfq_id: i64) -> Result<Option<Rfq>, QueryApiError> {
        self.db.fetch_rfq(rfq_id).await
    }

    pub async fn quote_by_id(&self, quote_id: i64) -> Result<Option<Quote>, QueryApiError> {
        self.db.fetch_quote(quote_id).await
    }

    /// Resolves the supplier profile for a user account, if one exists.
    pub async fn supplier_for_user(&self, user_id: i64) -> Result<Option<Supplier>, QueryApiError> {
        self.db.fetch_supplier_for_user(user_id).await
    }

    /// The buyer's dashboard view: every RFQ they own together with the quotes received against it.
    pub async fn quotes_for_buyer(&self, buyer_id: i64) -> Result<Vec<RfqQuotes>, QueryApiError> {
        self.db.quotes_for_buyer(buyer_id).await
    }

    pub async fn order_by_id(&self, order_id: i64) -> Result<Option<Order>, QueryApiError> {
        self.db.fetch_order(order_id).await
    }

    pub async fn escrow_for_order(&self, order_id: i64) -> Result<Option<EscrowAccount>, QueryApiError> {
        self.db.fetch_escrow_for_order(order_id).await
    }

    pub async fn transaction_by_id(&self, transaction_id: i64) -> Result<Option<Transaction>, QueryApiError> {
        self.db.fetch_transaction(transaction_id).await
    }

    pub async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, QueryApiError> {
        self.db.search_transactions(query).await
    }

    /// All QC reports for an order, newest first.
    pub async fn qc_reports_for_order(&self, order_id: i64) -> Result<Vec<QcReport>, QueryApiError> {
        self.db.qc_reports_for_order(order_id).await
    }
}
