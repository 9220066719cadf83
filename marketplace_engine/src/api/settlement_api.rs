use std::fmt::Debug;

use log::*;

use crate::{
    api::query_objects::TransactionQueryFilter,
    db_types::{EscrowAccount, Transaction},
    events::{EventProducers, PaymentReleasedEvent},
    traits::{MarketplaceDatabase, MarketplaceError},
};

/// `SettlementApi` provides escrow release and transaction queries. The usual settlement path runs through
/// [`crate::QcApi`] after a passing inspection; this API covers buyer-initiated and administrative releases.
pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> SettlementApi<B>
where B: MarketplaceDatabase
{
    /// Release the escrow held against an order.
    ///
    /// This call is idempotent. If the escrow is already released, `Ok(None)` is returned and nothing changes;
    /// released funds are never clawed back.
    pub async fn release_escrow_for_order(&self, order_id: i64) -> Result<Option<EscrowAccount>, MarketplaceError> {
        let escrow = self.db.release_escrow(order_id).await?;
        match &escrow {
            Some(escrow) => info!("💸️ Escrow #{} ({} {}) released for order #{order_id}", escrow.id, escrow.amount, escrow.currency),
            None => debug!("💸️ Escrow for order #{order_id} was already released"),
        }
        Ok(escrow)
    }

    /// Release a held transaction on the buyer's say-so.
    ///
    /// Only the transaction's buyer may release it, and only from `Held` status. The order's escrow is released with
    /// it, and the `PaymentReleased` event fires so that the supplier can be notified.
    pub async fn release_transaction(
        &self,
        transaction_id: i64,
        acting_buyer_id: i64,
    ) -> Result<Transaction, MarketplaceError> {
        let tx = self
            .db
            .fetch_transaction(transaction_id)
            .await?
            .ok_or(MarketplaceError::TransactionNotFound(transaction_id))?;
        if tx.buyer_id != acting_buyer_id {
            return Err(MarketplaceError::NotTransactionBuyer);
        }
        let tx = self.db.release_transaction(transaction_id).await?;
        info!("💸️ Transaction #{} ({} {}) released by buyer #{acting_buyer_id}", tx.id, tx.amount, tx.currency);
        match self.db.fetch_order_for_transaction(tx.id).await {
            Ok(Some(order)) => {
                if let Err(e) = self.db.release_escrow(order.id).await {
                    error!("💸️ Transaction #{} released, but escrow for order #{} did not follow: {e}", tx.id, order.id);
                }
                self.call_payment_released_hook(&tx, order.id).await;
            },
            Ok(None) => warn!("💸️ Transaction #{} released, but it has no associated order", tx.id),
            Err(e) => error!("💸️ Transaction #{} released, but its order could not be loaded: {e}", tx.id),
        }
        Ok(tx)
    }

    /// Search transactions with the given filter. An empty filter returns everything, newest first.
    pub async fn search_transactions(
        &self,
        query: TransactionQueryFilter,
    ) -> Result<Vec<Transaction>, MarketplaceError> {
        trace!("💸️ Searching transactions. {query}");
        let transactions = self.db.search_transactions(query).await?;
        Ok(transactions)
    }

    async fn call_payment_released_hook(&self, tx: &Transaction, order_id: i64) {
        if self.producers.payment_released_producer.is_empty() {
            return;
        }
        let supplier_user_id = match self.db.fetch_supplier(tx.supplier_id).await {
            Ok(Some(supplier)) => supplier.user_id,
            Ok(None) => {
                warn!("💸️📬️ Supplier #{} not found while resolving event recipients", tx.supplier_id);
                return;
            },
            Err(e) => {
                warn!("💸️📬️ Could not resolve supplier #{} for event recipients: {e}", tx.supplier_id);
                return;
            },
        };
        for emitter in &self.producers.payment_released_producer {
            trace!("💸️📬️ Notifying payment released hook subscribers");
            let event = PaymentReleasedEvent::new(tx.id, order_id, supplier_user_id, tx.amount);
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
