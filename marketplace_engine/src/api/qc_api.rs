use std::fmt::Debug;

use log::*;
use tms_common::Money;

use crate::{
    db_types::{NewQcReport, Order, OrderStatus, QcReport, QcStatus},
    events::{DisputeOpenedEvent, EventProducers, PaymentReleasedEvent, QcCompletedEvent},
    traits::{MarketplaceDatabase, MarketplaceError},
};

/// `QcApi` records quality-control inspection reports against delivered orders and drives the settlement that
/// follows from the verdict.
///
/// A passing report releases the order's escrow and its held transaction. A failing report places the order in
/// dispute. In both cases the report itself is the source of truth; the follow-on settlement steps are best-effort
/// and a failure there is logged and retried by an operator rather than bubbling back to the inspector.
pub struct QcApi<B> {
    db: B,
    producers: EventProducers,
    threshold: i64,
}

impl<B> Debug for QcApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QcApi(threshold: {})", self.threshold)
    }
}

impl<B> QcApi<B> {
    pub fn new(db: B, producers: EventProducers, threshold: i64) -> Self {
        Self { db, producers, threshold }
    }

    /// The minimum score (inclusive) that counts as a pass.
    pub fn threshold(&self) -> i64 {
        self.threshold
    }
}

impl<B> QcApi<B>
where B: MarketplaceDatabase
{
    /// Submit a QC inspection report for an order.
    ///
    /// The report must carry at least one photo or video as evidence, and the score must lie in 0-100. The verdict is
    /// derived from the configured threshold: `score >= threshold` passes, anything lower fails.
    ///
    /// * On a pass, the order's escrow is released (idempotently; an already-released escrow is left alone), the
    ///   order is marked `Delivered` and the held transaction is released with it.
    /// * On a fail, the order moves to `Disputed`. The escrow is **not** touched; funds stay put until the dispute is
    ///   resolved.
    ///
    /// The `QcCompleted` event always fires, along with `PaymentReleased` or `DisputeOpened` as appropriate.
    pub async fn submit_report(&self, report: NewQcReport) -> Result<QcReport, MarketplaceError> {
        if !report.has_evidence() {
            return Err(MarketplaceError::MissingEvidence);
        }
        if !(0..=100).contains(&report.score) {
            return Err(MarketplaceError::InvalidScore(report.score));
        }
        let order_id = report.order_id;
        let order = self.db.fetch_order(order_id).await?.ok_or(MarketplaceError::OrderNotFound(order_id))?;
        let status = report.status.unwrap_or_else(|| QcStatus::from_score(report.score, self.threshold));
        let report = self.db.insert_qc_report(report, status).await?;
        info!("🔍️📋️ QC report #{} recorded for order #{order_id}. Verdict: {status} (score {})", report.id, report.score);
        match status {
            QcStatus::Passed => self.settle_passed_order(&order).await,
            QcStatus::Failed => self.dispute_failed_order(&order, &report).await,
        }
        self.call_qc_completed_hook(&order, &report).await;
        Ok(report)
    }

    /// Mark an order that passed inspection as `Delivered` and release its escrow and held transaction. An escrow
    /// that was already released is left alone, but the order still moves to `Delivered`. Errors here are logged and
    /// left for an operator; the report has already been recorded.
    async fn settle_passed_order(&self, order: &Order) {
        if let Err(e) = self.db.update_order_status(order.id, OrderStatus::Delivered).await {
            error!("🔍️💰️ Order #{} passed QC but could not be marked delivered: {e}", order.id);
        }
        match self.db.release_escrow(order.id).await {
            Ok(Some(escrow)) => {
                debug!("🔍️💰️ Escrow #{} released for order #{}", escrow.id, order.id);
                match self.db.release_transaction(order.transaction_id).await {
                    Ok(tx) => {
                        info!("🔍️💰️ Transaction #{} ({} {}) released to supplier #{}", tx.id, tx.amount, tx.currency, tx.supplier_id);
                        self.call_payment_released_hook(tx.id, order, tx.amount).await;
                    },
                    Err(e) => {
                        error!("🔍️💰️ Escrow for order #{} released, but transaction #{} failed to release: {e}", order.id, order.transaction_id);
                    },
                }
            },
            Ok(None) => {
                debug!("🔍️💰️ Escrow for order #{} was already released. Nothing to do.", order.id);
            },
            Err(e) => {
                error!("🔍️💰️ Could not release escrow for order #{}: {e}", order.id);
            },
        }
    }

    /// Place an order that failed inspection into dispute. The escrow stays untouched.
    async fn dispute_failed_order(&self, order: &Order, report: &QcReport) {
        match self.db.update_order_status(order.id, OrderStatus::Disputed).await {
            Ok(order) => {
                info!("🔍️⚠️ Order #{} is now in dispute following QC report #{}", order.id, report.id);
                self.call_dispute_opened_hook(&order, report).await;
            },
            Err(e) => {
                error!("🔍️⚠️ QC report #{} failed order #{}, but the order could not be disputed: {e}", report.id, order.id);
            },
        }
    }

    /// Fetch all QC reports for an order, newest first.
    pub async fn reports_for_order(&self, order_id: i64) -> Result<Vec<QcReport>, MarketplaceError> {
        let reports = self.db.qc_reports_for_order(order_id).await?;
        Ok(reports)
    }

    async fn supplier_user_id(&self, supplier_id: i64) -> Option<i64> {
        match self.db.fetch_supplier(supplier_id).await {
            Ok(Some(supplier)) => Some(supplier.user_id),
            Ok(None) => {
                warn!("🔍️📬️ Supplier #{supplier_id} not found while resolving event recipients");
                None
            },
            Err(e) => {
                warn!("🔍️📬️ Could not resolve supplier #{supplier_id} for event recipients: {e}");
                None
            },
        }
    }

    async fn call_qc_completed_hook(&self, order: &Order, report: &QcReport) {
        if self.producers.qc_completed_producer.is_empty() {
            return;
        }
        let Some(supplier_user_id) = self.supplier_user_id(order.supplier_id).await else { return };
        for emitter in &self.producers.qc_completed_producer {
            trace!("🔍️📬️ Notifying QC completed hook subscribers");
            let event = QcCompletedEvent::new(order.clone(), report.clone(), order.buyer_id, supplier_user_id);
            emitter.publish_event(event).await;
        }
    }

    async fn call_payment_released_hook(&self, transaction_id: i64, order: &Order, amount: Money) {
        if self.producers.payment_released_producer.is_empty() {
            return;
        }
        let Some(supplier_user_id) = self.supplier_user_id(order.supplier_id).await else { return };
        for emitter in &self.producers.payment_released_producer {
            trace!("🔍️📬️ Notifying payment released hook subscribers");
            let event = PaymentReleasedEvent::new(transaction_id, order.id, supplier_user_id, amount);
            emitter.publish_event(event).await;
        }
    }

    async fn call_dispute_opened_hook(&self, order: &Order, report: &QcReport) {
        if self.producers.dispute_opened_producer.is_empty() {
            return;
        }
        let Some(supplier_user_id) = self.supplier_user_id(order.supplier_id).await else { return };
        for emitter in &self.producers.dispute_opened_producer {
            trace!("🔍️📬️ Notifying dispute opened hook subscribers");
            let event = DisputeOpenedEvent::new(order.clone(), report.clone(), order.buyer_id, supplier_user_id);
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
