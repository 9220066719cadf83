//! `SqliteDatabase` is a concrete implementation of a marketplace engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{auth, db_url, escrow, new_pool, orders, qc_reports, quotes, rfqs, transactions, users};
use crate::{
    api::query_objects::{RfqQuotes, TransactionQueryFilter},
    db_types::{
        AcceptedQuote,
        EscrowAccount,
        NewQcReport,
        NewQuote,
        NewRfq,
        Order,
        OrderStatus,
        QcReport,
        QcStatus,
        Quote,
        QuoteStatus,
        Rfq,
        Role,
        Supplier,
        Transaction,
        User,
    },
    traits::{AuthApiError, AuthManagement, MarketplaceDatabase, MarketplaceError, QueryApiError, QueryManagement},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_rfq(&self, rfq: NewRfq) -> Result<Rfq, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let rfq = rfqs::insert_rfq(rfq, &mut conn).await?;
        debug!("🗃️ RFQ #{} has been saved in the DB", rfq.id);
        Ok(rfq)
    }

    /// Takes a new quote, and in a single atomic transaction,
    /// * verifies that the RFQ exists and still accepts quotes
    /// * inserts the quote (the one-quote-per-supplier constraint is enforced by the schema)
    /// * flips the RFQ to `Quoted` if this is the first quote received
    async fn insert_quote(&self, quote: NewQuote) -> Result<Quote, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let rfq_id = quote.rfq_id;
        let rfq = rfqs::fetch_rfq(rfq_id, &mut tx).await?.ok_or(MarketplaceError::RfqNotFound(rfq_id))?;
        if !rfq.status.accepts_quotes() {
            return Err(MarketplaceError::RfqNotOpen(rfq_id));
        }
        let quote = quotes::insert_quote(quote, &mut tx).await?;
        rfqs::mark_quoted(rfq_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Quote #{} has been saved against RFQ #{rfq_id}", quote.id);
        Ok(quote)
    }

    /// Accepts a quote as a single atomic unit. In one transaction:
    /// * the RFQ is closed to further quotes (a conditional update; a racing acceptance loses here)
    /// * the quote moves from `Pending` to `Accepted`
    /// * the `Held` transaction, the `Confirmed` order and the `Funded` escrow account are created
    ///
    /// Either every record exists afterwards, or none do.
    async fn accept_quote(&self, quote_id: i64) -> Result<AcceptedQuote, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let quote =
            quotes::fetch_quote(quote_id, &mut tx).await?.ok_or(MarketplaceError::QuoteNotFound(quote_id))?;
        if quote.status != QuoteStatus::Pending {
            return Err(MarketplaceError::QuoteAlreadyDecided(quote_id));
        }
        let rfq = rfqs::close_rfq_for_acceptance(quote.rfq_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::RfqNotOpen(quote.rfq_id))?;
        let quote = quotes::mark_accepted(quote_id, &mut tx)
            .await?
            .ok_or(MarketplaceError::QuoteAlreadyDecided(quote_id))?;
        let transaction = transactions::insert_transaction(&rfq, &quote, &mut tx).await?;
        trace!("🗃️ Transaction #{} created holding {} {}", transaction.id, transaction.amount, transaction.currency);
        let order = orders::insert_order(&transaction, &mut tx).await?;
        let escrow = escrow::insert_escrow(order.id, transaction.amount, &transaction.currency, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Quote #{quote_id} accepted. RFQ #{} closed, order #{} confirmed, escrow #{} funded.",
            rfq.id, order.id, escrow.id
        );
        Ok(AcceptedQuote { rfq, quote, transaction, order, escrow })
    }

    async fn reject_quote(&self, quote_id: i64) -> Result<Quote, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let quote =
            quotes::fetch_quote(quote_id, &mut conn).await?.ok_or(MarketplaceError::QuoteNotFound(quote_id))?;
        if quote.status != QuoteStatus::Pending {
            return Err(MarketplaceError::QuoteAlreadyDecided(quote_id));
        }
        let quote = quotes::mark_rejected(quote_id, &mut conn)
            .await?
            .ok_or(MarketplaceError::QuoteAlreadyDecided(quote_id))?;
        Ok(quote)
    }

    /// Records a QC report. When the verdict is a pass, the escrow's `qc_passed` flag is set in the same transaction
    /// so that the report and the flag can never disagree.
    async fn insert_qc_report(&self, report: NewQcReport, status: QcStatus) -> Result<QcReport, MarketplaceError> {
        let mut tx = self.pool.begin().await?;
        let order_id = report.order_id;
        let report = qc_reports::insert_report(report, status, &mut tx).await?;
        if status == QcStatus::Passed {
            escrow::set_qc_passed(order_id, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ QC report #{} ({status}) saved for order #{order_id}", report.id);
        Ok(report)
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_status(order_id, status, &mut conn).await?;
        debug!("🗃️ Order #{order_id} is now {status}");
        Ok(order)
    }

    async fn release_escrow(&self, order_id: i64) -> Result<Option<EscrowAccount>, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        if escrow::fetch_escrow_for_order(order_id, &mut conn).await?.is_none() {
            return Err(MarketplaceError::EscrowNotFound(order_id));
        }
        let released = escrow::release_escrow(order_id, &mut conn).await?;
        Ok(released)
    }

    async fn release_transaction(&self, transaction_id: i64) -> Result<Transaction, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        match transactions::release_transaction(transaction_id, &mut conn).await? {
            Some(tx) => Ok(tx),
            None => match transactions::fetch_transaction(transaction_id, &mut conn).await? {
                Some(_) => Err(MarketplaceError::TransactionNotHeld(transaction_id)),
                None => Err(MarketplaceError::TransactionNotFound(transaction_id)),
            },
        }
    }

    async fn close(&mut self) -> Result<(), MarketplaceError> {
        self.pool.close().await;
        Ok(())
    }
}

impl QueryManagement for SqliteDatabase {
    async fn fetch_rfq(&self, rfq_id: i64) -> Result<Option<Rfq>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let rfq = rfqs::fetch_rfq(rfq_id, &mut conn).await?;
        Ok(rfq)
    }

    async fn fetch_quote(&self, quote_id: i64) -> Result<Option<Quote>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let quote = quotes::fetch_quote(quote_id, &mut conn).await?;
        Ok(quote)
    }

    async fn fetch_supplier_for_user(&self, user_id: i64) -> Result<Option<Supplier>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let supplier = users::fetch_supplier_for_user(user_id, &mut conn).await?;
        Ok(supplier)
    }

    async fn fetch_supplier(&self, supplier_id: i64) -> Result<Option<Supplier>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let supplier = users::fetch_supplier(supplier_id, &mut conn).await?;
        Ok(supplier)
    }

    async fn quotes_for_buyer(&self, buyer_id: i64) -> Result<Vec<RfqQuotes>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let rfqs = rfqs::rfqs_for_buyer(buyer_id, &mut conn).await?;
        let mut result = Vec::with_capacity(rfqs.len());
        for rfq in rfqs {
            let quotes = quotes::quotes_for_rfq(rfq.id, &mut conn).await?;
            result.push(RfqQuotes::new(rfq, quotes));
        }
        Ok(result)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_for_transaction(&self, transaction_id: i64) -> Result<Option<Order>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_transaction(transaction_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_escrow_for_order(&self, order_id: i64) -> Result<Option<EscrowAccount>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let escrow = escrow::fetch_escrow_for_order(order_id, &mut conn).await?;
        Ok(escrow)
    }

    async fn fetch_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::fetch_transaction(transaction_id, &mut conn).await?;
        Ok(tx)
    }

    async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let transactions = transactions::search_transactions(query, &mut conn).await?;
        Ok(transactions)
    }

    async fn qc_reports_for_order(&self, order_id: i64) -> Result<Vec<QcReport>, QueryApiError> {
        let mut conn = self.pool.acquire().await?;
        let reports = qc_reports::reports_for_order(order_id, &mut conn).await?;
        Ok(reports)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn check_api_key(&self, user_id: i64, api_key: &str) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::check_api_key(user_id, api_key, &mut conn).await
    }

    // This implementation is an upsert under the hood
    async fn upsert_nonce_for_user(&self, user_id: i64, nonce: u64) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::upsert_nonce_for_user(user_id, nonce, &mut conn).await
    }

    async fn check_user_has_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::user_has_roles(user_id, roles, &mut conn).await
    }

    async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::roles_for_user(user_id, &mut conn).await
    }

    // The role insert is a single multi-row statement, so no explicit transaction is needed. Wrapping the read-only
    // role lookup and the insert in one deferred transaction would force a lock upgrade midway through, which
    // SQLite answers with SQLITE_BUSY under concurrent writers.
    async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::assign_roles(user_id, roles, &mut conn).await?;
        debug!("🔑️ Roles {roles:?} assigned to user #{user_id}");
        Ok(())
    }

    async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError> {
        let mut conn = self.pool.acquire().await.map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
        auth::remove_roles(user_id, roles, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates a new user account. Accounts are provisioned by an operator, not through the HTTP API.
    pub async fn create_user(&self, username: &str, api_key: &str) -> Result<User, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::insert_user(username, api_key, &mut conn).await?;
        debug!("🗃️ User account '{username}' created as #{}", user.id);
        Ok(user)
    }

    /// Attaches a supplier profile to an existing user account.
    pub async fn create_supplier(&self, user_id: i64, company_name: &str) -> Result<Supplier, MarketplaceError> {
        let mut conn = self.pool.acquire().await?;
        let supplier = users::insert_supplier(user_id, company_name, &mut conn).await?;
        debug!("🗃️ Supplier profile '{company_name}' created as #{} for user #{user_id}", supplier.id);
        Ok(supplier)
    }
}
