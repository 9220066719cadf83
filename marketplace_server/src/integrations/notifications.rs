//! Notification fan-out.
//!
//! The engine fires events at the pivotal moments of the marketplace flow (quote submitted, quote accepted, QC
//! verdicts, payment released, dispute opened). This module subscribes to all of them and turns each one into a
//! [`Notification`] for the affected parties.
//!
//! Delivery is fire-and-forget through the structured log, under the `tms::notifications` target. An external
//! shipper (email, push, whatever the deployment uses) tails that stream; the server itself never blocks on
//! delivery and a lost notification never affects the underlying flow.

use std::sync::Arc;

use futures::FutureExt;
use log::info;
use marketplace_engine::{
    db_types::QcStatus,
    events::{EventHooks, QcCompletedEvent},
};
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "tms::notifications";

/// Who a notification is addressed to. Suppliers are addressed by their user account so that the delivery layer only
/// ever deals in user ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub recipient_user_id: i64,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new<S1: Into<String>, S2: Into<String>>(recipient_user_id: i64, subject: S1, body: S2) -> Self {
        Self { recipient_user_id, subject: subject.into(), body: body.into() }
    }
}

/// The log-backed notification channel.
#[derive(Debug, Clone, Default)]
pub struct NotificationSink;

impl NotificationSink {
    pub fn dispatch(&self, notification: Notification) {
        let payload = serde_json::to_string(&notification).unwrap_or_else(|e| format!("{e}"));
        info!(target: LOG_TARGET, "📨️ {payload}");
    }
}

/// Build the event hooks that drive notification fan-out. The returned hooks are handed to
/// [`marketplace_engine::events::EventHandlers`] when the server starts.
pub fn create_notification_hooks() -> EventHooks {
    let sink = Arc::new(NotificationSink);
    let mut hooks = EventHooks::default();
    let s = Arc::clone(&sink);
    hooks.on_quote_submitted(move |ev| {
        let notification = Notification::new(
            ev.rfq.buyer_id,
            format!("New quote on '{}'", ev.rfq.title),
            format!(
                "Supplier #{} quoted {} {} with a lead time of {} days on RFQ #{}.",
                ev.quote.supplier_id, ev.quote.price, ev.quote.currency, ev.quote.lead_time_days, ev.rfq.id
            ),
        );
        s.dispatch(notification);
        async {}.boxed()
    });
    let s = Arc::clone(&sink);
    hooks.on_quote_accepted(move |ev| {
        let notification = Notification::new(
            ev.rfq.buyer_id,
            format!("Quote accepted on '{}'", ev.rfq.title),
            format!(
                "Order #{} was created for {} {}. The funds are held in escrow until quality control passes.",
                ev.order.id, ev.quote.price, ev.quote.currency
            ),
        );
        s.dispatch(notification);
        async {}.boxed()
    });
    let s = Arc::clone(&sink);
    hooks.on_qc_completed(move |ev: QcCompletedEvent| {
        let verdict = match ev.status() {
            QcStatus::Passed => "passed",
            QcStatus::Failed => "failed",
        };
        let subject = format!("QC {verdict} on order #{}", ev.order.id);
        let body = format!("The inspection scored {}. Verdict: {verdict}.", ev.report.score);
        s.dispatch(Notification::new(ev.buyer_user_id, subject.clone(), body.clone()));
        s.dispatch(Notification::new(ev.supplier_user_id, subject, body));
        async {}.boxed()
    });
    let s = Arc::clone(&sink);
    hooks.on_payment_released(move |ev| {
        let notification = Notification::new(
            ev.supplier_user_id,
            format!("Payment released for order #{}", ev.order_id),
            format!("{} has been released from escrow on transaction #{}.", ev.amount, ev.transaction_id),
        );
        s.dispatch(notification);
        async {}.boxed()
    });
    let s = Arc::clone(&sink);
    hooks.on_dispute_opened(move |ev| {
        let subject = format!("Dispute opened on order #{}", ev.order.id);
        let body = format!(
            "Quality control failed with a score of {}. The escrowed funds stay frozen until the dispute is resolved.",
            ev.report.score
        );
        s.dispatch(Notification::new(ev.buyer_user_id, subject.clone(), body.clone()));
        s.dispatch(Notification::new(ev.supplier_user_id, subject, body));
        async {}.boxed()
    });
    hooks
}
