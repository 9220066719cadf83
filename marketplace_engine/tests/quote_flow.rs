//! Integration tests for the quote lifecycle, from RFQ creation through to the buyer's decision.

use log::*;
use marketplace_engine::{
    db_types::{EscrowStatus, NewQuote, OrderStatus, QuoteDecision, QuoteStatus, RfqStatus, TransactionStatus},
    events::EventProducers,
    traits::{MarketplaceDatabase, MarketplaceError, QueryManagement},
    DecidedQuote,
    QuoteFlowApi,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};
use support::{
    prepare_env::{prepare_test_env, random_db_path},
    seed::{seed_parties, widget_rfq, Parties},
};
use tms_common::Money;

mod support;

async fn setup() -> (QuoteFlowApi<SqliteDatabase>, Parties) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let parties = seed_parties(&db).await;
    (QuoteFlowApi::new(db, EventProducers::default()), parties)
}

async fn tear_down(api: QuoteFlowApi<SqliteDatabase>) {
    let mut api = api;
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(api.db().url()).await.unwrap();
}

#[tokio::test]
async fn submitting_a_quote_marks_the_rfq_quoted() {
    let (api, parties) = setup().await;
    let rfq = api.create_rfq(widget_rfq(parties.buyer.id)).await.expect("Error creating RFQ");
    assert_eq!(rfq.status, RfqStatus::Open);

    let quote = NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(4200), 14);
    let quote = api.submit_quote(quote).await.expect("Error submitting quote");
    assert_eq!(quote.status, QuoteStatus::Pending);
    assert_eq!(quote.price, Money::from_units(4200));

    let rfq = api.db().fetch_rfq(rfq.id).await.unwrap().unwrap();
    assert_eq!(rfq.status, RfqStatus::Quoted);
    tear_down(api).await;
}

#[tokio::test]
async fn one_quote_per_supplier_per_rfq() {
    let (api, parties) = setup().await;
    let rfq = api.create_rfq(widget_rfq(parties.buyer.id)).await.unwrap();
    let quote = NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(4200), 14);
    let first = api.submit_quote(quote).await.expect("Error submitting quote");

    // A sharper price from the same supplier is still a duplicate
    let again = NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(3900), 10);
    let err = api.submit_quote(again).await.expect_err("Duplicate quote was accepted");
    assert!(matches!(err, MarketplaceError::DuplicateQuote { .. }), "got {err}");

    // The original quote is untouched
    let unchanged = api.db().fetch_quote(first.id).await.unwrap().unwrap();
    assert_eq!(unchanged.price, Money::from_units(4200));

    // A different supplier can still quote
    let other = NewQuote::new(rfq.id, parties.supplier_b.id, Money::from_units(4500), 7);
    api.submit_quote(other).await.expect("Second supplier could not quote");
    tear_down(api).await;
}

#[tokio::test]
async fn quoting_a_missing_or_closed_rfq_fails() {
    let (api, parties) = setup().await;
    let quote = NewQuote::new(999, parties.supplier_a.id, Money::from_units(100), 3);
    let err = api.submit_quote(quote).await.expect_err("Quote against missing RFQ was accepted");
    assert!(matches!(err, MarketplaceError::RfqNotFound(999)), "got {err}");

    let rfq = api.create_rfq(widget_rfq(parties.buyer.id)).await.unwrap();
    let quote = NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(4200), 14);
    let quote = api.submit_quote(quote).await.unwrap();
    api.decide_quote(quote.id, QuoteDecision::Accepted, parties.buyer.id).await.unwrap();

    let late = NewQuote::new(rfq.id, parties.supplier_b.id, Money::from_units(4000), 5);
    let err = api.submit_quote(late).await.expect_err("Quote against closed RFQ was accepted");
    assert!(matches!(err, MarketplaceError::RfqNotOpen(_)), "got {err}");
    tear_down(api).await;
}

#[tokio::test]
async fn acceptance_creates_the_full_settlement_bundle() {
    let (api, parties) = setup().await;
    let rfq = api.create_rfq(widget_rfq(parties.buyer.id)).await.unwrap();
    let quote = NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(4200), 14);
    let quote = api.submit_quote(quote).await.unwrap();

    let decided = api.decide_quote(quote.id, QuoteDecision::Accepted, parties.buyer.id).await.unwrap();
    let DecidedQuote::Accepted(accepted) = decided else { panic!("Expected an acceptance") };

    assert_eq!(accepted.rfq.status, RfqStatus::Closed);
    assert_eq!(accepted.quote.status, QuoteStatus::Accepted);
    assert_eq!(accepted.transaction.status, TransactionStatus::Held);
    assert_eq!(accepted.transaction.amount, quote.price);
    assert_eq!(accepted.transaction.buyer_id, parties.buyer.id);
    assert_eq!(accepted.transaction.supplier_id, parties.supplier_a.id);
    assert_eq!(accepted.order.status, OrderStatus::Confirmed);
    assert_eq!(accepted.order.transaction_id, accepted.transaction.id);
    assert_eq!(accepted.escrow.status, EscrowStatus::Funded);
    assert_eq!(accepted.escrow.amount, quote.price);
    assert_eq!(accepted.escrow.order_id, accepted.order.id);
    tear_down(api).await;
}

#[tokio::test]
async fn rejection_only_touches_the_quote() {
    let (api, parties) = setup().await;
    let rfq = api.create_rfq(widget_rfq(parties.buyer.id)).await.unwrap();
    let quote = NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(4200), 14);
    let quote = api.submit_quote(quote).await.unwrap();

    let decided = api.decide_quote(quote.id, QuoteDecision::Rejected, parties.buyer.id).await.unwrap();
    let DecidedQuote::Rejected(rejected) = decided else { panic!("Expected a rejection") };
    assert_eq!(rejected.status, QuoteStatus::Rejected);

    // The RFQ stays open for other suppliers
    let rfq = api.db().fetch_rfq(rfq.id).await.unwrap().unwrap();
    assert!(rfq.status.accepts_quotes());

    // And the decision is final
    let err = api.decide_quote(quote.id, QuoteDecision::Accepted, parties.buyer.id).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::QuoteAlreadyDecided(_)), "got {err}");
    tear_down(api).await;
}

#[tokio::test]
async fn only_the_rfq_owner_may_decide() {
    let (api, parties) = setup().await;
    let rfq = api.create_rfq(widget_rfq(parties.buyer.id)).await.unwrap();
    let quote = NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(4200), 14);
    let quote = api.submit_quote(quote).await.unwrap();

    let err = api
        .decide_quote(quote.id, QuoteDecision::Accepted, parties.supplier_a_user.id)
        .await
        .expect_err("Interloper decided someone else's quote");
    assert!(matches!(err, MarketplaceError::NotRfqOwner), "got {err}");
    tear_down(api).await;
}

#[tokio::test]
async fn concurrent_acceptances_cannot_both_win() {
    let (api, parties) = setup().await;
    let rfq = api.create_rfq(widget_rfq(parties.buyer.id)).await.unwrap();
    let q1 = NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(4200), 14);
    let q1 = api.submit_quote(q1).await.unwrap();
    let q2 = NewQuote::new(rfq.id, parties.supplier_b.id, Money::from_units(4100), 21);
    let q2 = api.submit_quote(q2).await.unwrap();

    let buyer_id = parties.buyer.id;
    let (r1, r2) =
        tokio::join!(api.decide_quote(q1.id, QuoteDecision::Accepted, buyer_id), api.decide_quote(
            q2.id,
            QuoteDecision::Accepted,
            buyer_id
        ));
    let winners = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "Exactly one acceptance must win: {r1:?} / {r2:?}");
    let loser = if r1.is_err() { r1.unwrap_err() } else { r2.unwrap_err() };
    assert!(matches!(loser, MarketplaceError::RfqNotOpen(_)), "got {loser}");
    tear_down(api).await;
}
