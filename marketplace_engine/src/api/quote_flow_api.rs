use std::fmt::Debug;

use log::*;
use serde::Serialize;

use crate::{
    db_types::{AcceptedQuote, NewQuote, NewRfq, Quote, QuoteDecision, Rfq},
    events::{EventProducers, QuoteAcceptedEvent, QuoteSubmittedEvent},
    traits::{MarketplaceDatabase, MarketplaceError},
};

/// The result of a buyer's decision on a quote. Accepting a quote produces the entire bundle of records created by the
/// atomic acceptance unit, while rejecting it only touches the quote itself.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision", content = "result")]
pub enum DecidedQuote {
    Accepted(Box<AcceptedQuote>),
    Rejected(Quote),
}

/// `QuoteFlowApi` is the primary API for the RFQ and quote lifecycle. It handles quote submissions from suppliers and
/// decisions from buyers, and emits the corresponding events.
pub struct QuoteFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for QuoteFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "QuoteFlowApi")
    }
}

impl<B> QuoteFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> QuoteFlowApi<B>
where B: MarketplaceDatabase
{
    /// Open a new request for quotes on behalf of a buyer.
    pub async fn create_rfq(&self, rfq: NewRfq) -> Result<Rfq, MarketplaceError> {
        let rfq = self.db.insert_rfq(rfq).await?;
        debug!("🛒️📋️ RFQ #{} ({}) opened by buyer #{}", rfq.id, rfq.title, rfq.buyer_id);
        Ok(rfq)
    }

    /// Submit a new supplier quote against an open RFQ.
    ///
    /// The RFQ must exist and still accept quotes, and a supplier may only quote once per RFQ. A second submission
    /// from the same supplier returns [`MarketplaceError::DuplicateQuote`] and leaves the first quote untouched.
    ///
    /// On success the `QuoteSubmitted` event fires so that the buyer can be notified.
    pub async fn submit_quote(&self, quote: NewQuote) -> Result<Quote, MarketplaceError> {
        let quote = self.db.insert_quote(quote).await?;
        debug!("🛒️📨️ Quote #{} submitted by supplier #{} for RFQ #{}", quote.id, quote.supplier_id, quote.rfq_id);
        match self.db.fetch_rfq(quote.rfq_id).await {
            Ok(Some(rfq)) => self.call_quote_submitted_hook(rfq, quote.clone()).await,
            Ok(None) => warn!("🛒️📨️ RFQ #{} vanished right after quote #{} was inserted", quote.rfq_id, quote.id),
            Err(e) => warn!("🛒️📨️ Could not load RFQ #{} for the quote submitted event: {e}", quote.rfq_id),
        }
        Ok(quote)
    }

    /// Record the buyer's decision on a quote.
    ///
    /// Only the buyer who owns the RFQ may decide its quotes. Acceptance runs as a single atomic unit: the quote is
    /// marked accepted, the RFQ closes to further quotes, and the transaction, order and escrow account are created
    /// together. Two concurrent acceptances on quotes of the same RFQ cannot both succeed; the loser receives
    /// [`MarketplaceError::RfqNotOpen`].
    ///
    /// Rejection only flips the quote status and emits no events.
    pub async fn decide_quote(
        &self,
        quote_id: i64,
        decision: QuoteDecision,
        acting_buyer_id: i64,
    ) -> Result<DecidedQuote, MarketplaceError> {
        let quote = self.db.fetch_quote(quote_id).await?.ok_or(MarketplaceError::QuoteNotFound(quote_id))?;
        let rfq = self.db.fetch_rfq(quote.rfq_id).await?.ok_or(MarketplaceError::RfqNotFound(quote.rfq_id))?;
        if rfq.buyer_id != acting_buyer_id {
            return Err(MarketplaceError::NotRfqOwner);
        }
        match decision {
            QuoteDecision::Accepted => {
                let accepted = self.db.accept_quote(quote_id).await?;
                info!(
                    "🛒️🤝️ Quote #{quote_id} accepted. Order #{} created for {} {}",
                    accepted.order.id, accepted.transaction.amount, accepted.transaction.currency
                );
                self.call_quote_accepted_hook(&accepted).await;
                Ok(DecidedQuote::Accepted(Box::new(accepted)))
            },
            QuoteDecision::Rejected => {
                let quote = self.db.reject_quote(quote_id).await?;
                debug!("🛒️🚫️ Quote #{quote_id} rejected by buyer #{acting_buyer_id}");
                Ok(DecidedQuote::Rejected(quote))
            },
        }
    }

    async fn call_quote_submitted_hook(&self, rfq: Rfq, quote: Quote) {
        for emitter in &self.producers.quote_submitted_producer {
            trace!("🛒️📨️ Notifying quote submitted hook subscribers");
            let event = QuoteSubmittedEvent::new(rfq.clone(), quote.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_quote_accepted_hook(&self, accepted: &AcceptedQuote) {
        for emitter in &self.producers.quote_accepted_producer {
            trace!("🛒️🤝️ Notifying quote accepted hook subscribers");
            let event =
                QuoteAcceptedEvent::new(accepted.rfq.clone(), accepted.quote.clone(), accepted.order.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
