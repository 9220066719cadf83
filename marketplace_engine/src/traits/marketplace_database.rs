use thiserror::Error;

use crate::{
    db_types::{AcceptedQuote, EscrowAccount, NewQcReport, NewQuote, NewRfq, Order, OrderStatus, QcReport, QcStatus, Quote, Rfq, Transaction},
    traits::{QueryApiError, QueryManagement},
};

/// The highest level of behaviour for backends supporting the settlement engine.
///
/// This behaviour includes:
/// * The quote lifecycle (submission, acceptance, rejection) with its atomicity guarantees
/// * The escrow ledger (idempotent, QC-gated release; buyer-initiated release)
/// * QC report persistence and the order state machine it drives
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase: Clone + QueryManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts a new RFQ with `Open` status and returns the stored record.
    async fn insert_rfq(&self, rfq: NewRfq) -> Result<Rfq, MarketplaceError>;

    /// Inserts a quote against an RFQ, in a single atomic transaction:
    /// * the RFQ must exist and accept quotes (`Open` or `Quoted`), otherwise `RfqNotFound` / `RfqNotOpen`;
    /// * no prior quote from this supplier may exist for the RFQ, otherwise `DuplicateQuote`;
    /// * the quote is stored with `Pending` status;
    /// * an `Open` RFQ transitions to `Quoted`.
    async fn insert_quote(&self, quote: NewQuote) -> Result<Quote, MarketplaceError>;

    /// Accepts a pending quote, in a single atomic transaction:
    /// * closes the parent RFQ with a conditional update (`status IN ('Open','Quoted')`); if the RFQ was already
    ///   closed, for example by a concurrent acceptance of a sibling quote, the whole unit rolls back with
    ///   `RfqNotOpen`;
    /// * marks the quote `Accepted`;
    /// * creates the `Transaction` (amount = quote price, status `Held`);
    /// * creates the fulfillment `Order` (status `Confirmed`) and its `EscrowAccount` (status `Funded`).
    ///
    /// Either every write commits or none is observable.
    async fn accept_quote(&self, quote_id: i64) -> Result<AcceptedQuote, MarketplaceError>;

    /// Marks a pending quote `Rejected`. The parent RFQ is left untouched and remains open to other suppliers.
    async fn reject_quote(&self, quote_id: i64) -> Result<Quote, MarketplaceError>;

    /// Stores a QC report verbatim. This is the single write of the QC submission flow that must succeed; all state
    /// transitions driven by the verdict are separate, best-effort operations.
    async fn insert_qc_report(&self, report: NewQcReport, status: QcStatus) -> Result<QcReport, MarketplaceError>;

    /// Sets the order status. A single-row update; returns the updated order.
    async fn update_order_status(&self, order_id: i64, status: OrderStatus) -> Result<Order, MarketplaceError>;

    /// Releases the escrow for the given order if it is in a releasable state (`Funded` or `Held`): status becomes
    /// `Released`, `qc_passed` is set and `released_at` is stamped.
    ///
    /// Release is idempotent per order: if the escrow is already `Released`, `Ok(None)` is returned and nothing is
    /// written. A missing escrow account is an `EscrowNotFound` error.
    async fn release_escrow(&self, order_id: i64) -> Result<Option<EscrowAccount>, MarketplaceError>;

    /// Buyer-initiated release of a held transaction: a conditional `Held` → `Released` update. Returns
    /// `TransactionNotHeld` if the transaction is in any other state.
    async fn release_transaction(&self, transaction_id: i64) -> Result<Transaction, MarketplaceError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), MarketplaceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum MarketplaceError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested RFQ (id {0}) does not exist")]
    RfqNotFound(i64),
    #[error("RFQ {0} is closed and does not accept this operation")]
    RfqNotOpen(i64),
    #[error("The requested quote (id {0}) does not exist")]
    QuoteNotFound(i64),
    #[error("Supplier {supplier_id} has already submitted a quote for RFQ {rfq_id}")]
    DuplicateQuote { rfq_id: i64, supplier_id: i64 },
    #[error("Quote {0} has already been decided")]
    QuoteAlreadyDecided(i64),
    #[error("The requested order (id {0}) does not exist")]
    OrderNotFound(i64),
    #[error("No escrow account exists for order {0}")]
    EscrowNotFound(i64),
    #[error("The requested transaction (id {0}) does not exist")]
    TransactionNotFound(i64),
    #[error("Transaction {0} is not in 'Held' status and cannot be released")]
    TransactionNotHeld(i64),
    #[error("{0}")]
    QueryError(#[from] QueryApiError),
    #[error("Only the buyer owning the RFQ may decide its quotes")]
    NotRfqOwner,
    #[error("Caller is not a party to this order")]
    NotOrderParty,
    #[error("Only the transaction's buyer may release it")]
    NotTransactionBuyer,
    #[error("Caller has no supplier profile")]
    NoSupplierProfile,
    #[error("A QC report needs at least one photo or video as evidence")]
    MissingEvidence,
    #[error("QC score {0} is outside the valid range 0-100")]
    InvalidScore(i64),
    #[error("'{0}' is not a valid quote decision (expected 'accepted' or 'rejected')")]
    InvalidDecision(String),
}

impl From<sqlx::Error> for MarketplaceError {
    fn from(e: sqlx::Error) -> Self {
        MarketplaceError::DatabaseError(e.to_string())
    }
}
