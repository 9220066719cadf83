//! End-to-end checks that the settlement flows fire their events.

use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use futures_util::FutureExt;
use log::*;
use marketplace_engine::{
    db_types::{NewQcReport, NewQuote, QuoteDecision},
    events::{EventHandlers, EventHooks},
    traits::MarketplaceDatabase,
    DecidedQuote,
    QcApi,
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

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::Relaxed)
    }
}

async fn setup() -> (SqliteDatabase, Parties) {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let parties = seed_parties(&db).await;
    (db, parties)
}

async fn tear_down(db: SqliteDatabase) {
    if let Err(e) = Sqlite::drop_database(db.url()).await {
        error!("🚀️ Failed to drop database: {e}");
    }
}

#[tokio::test]
async fn quote_flow_events_fire() {
    let submitted = HookCalled::default();
    let accepted = HookCalled::default();
    let submitted_copy = submitted.clone();
    let accepted_copy = accepted.clone();
    let mut hooks = EventHooks::default();
    hooks.on_quote_submitted(move |ev| {
        info!("🪝️ Quote #{} submitted for RFQ '{}'", ev.quote.id, ev.rfq.title);
        submitted_copy.called();
        async {}.boxed()
    });
    hooks.on_quote_accepted(move |ev| {
        info!("🪝️ Quote #{} accepted, order #{}", ev.quote.id, ev.order.id);
        accepted_copy.called();
        async {}.boxed()
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();

    let (db, parties) = setup().await;
    let api = QuoteFlowApi::new(db.clone(), producers);
    let rfq = api.create_rfq(widget_rfq(parties.buyer.id)).await.unwrap();
    let q1 = api.submit_quote(NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(4200), 14)).await.unwrap();
    let _q2 =
        api.submit_quote(NewQuote::new(rfq.id, parties.supplier_b.id, Money::from_units(3900), 30)).await.unwrap();
    let _ = api.decide_quote(q1.id, QuoteDecision::Accepted, parties.buyer.id).await.unwrap();

    // Dropping the producers closes the channels, so the handlers drain and shut down
    drop(api);
    handlers.start_handlers().await;
    tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;

    assert_eq!(submitted.count(), 2);
    assert_eq!(accepted.count(), 1);
    tear_down(db).await;
}

#[tokio::test]
async fn dead_subscribers_never_fail_the_operation() {
    let mut hooks = EventHooks::default();
    hooks.on_quote_submitted(|_ev| async {}.boxed());
    hooks.on_quote_accepted(|_ev| async {}.boxed());
    hooks.on_qc_completed(|_ev| async {}.boxed());
    hooks.on_payment_released(|_ev| async {}.boxed());
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();
    // The handlers are never started and dropped here, so every channel is closed before a single event fires
    drop(handlers);

    let (db, parties) = setup().await;
    let quote_flow = QuoteFlowApi::new(db.clone(), producers.clone());
    let rfq = quote_flow.create_rfq(widget_rfq(parties.buyer.id)).await.unwrap();
    let quote = quote_flow
        .submit_quote(NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(4200), 14))
        .await
        .expect("Quote submission failed because its notification could not be delivered");
    let decided = quote_flow
        .decide_quote(quote.id, QuoteDecision::Accepted, parties.buyer.id)
        .await
        .expect("Quote acceptance failed because its notification could not be delivered");
    let DecidedQuote::Accepted(bundle) = decided else { panic!("Expected an acceptance") };

    let qc = QcApi::new(db.clone(), producers, 70);
    let report = NewQcReport::new(bundle.order.id, 90).with_photos(vec!["pallet.jpg".into()]);
    qc.submit_report(report).await.expect("QC report failed because its notification could not be delivered");
    tear_down(db).await;
}

#[tokio::test]
async fn qc_verdicts_fire_payment_and_dispute_events() {
    let completed = HookCalled::default();
    let released = HookCalled::default();
    let disputed = HookCalled::default();
    let completed_copy = completed.clone();
    let released_copy = released.clone();
    let disputed_copy = disputed.clone();
    let mut hooks = EventHooks::default();
    hooks.on_qc_completed(move |ev| {
        info!("🪝️ QC completed on order #{} with {}", ev.order.id, ev.status());
        completed_copy.called();
        async {}.boxed()
    });
    hooks.on_payment_released(move |ev| {
        info!("🪝️ {} released to user #{}", ev.amount, ev.supplier_user_id);
        released_copy.called();
        async {}.boxed()
    });
    hooks.on_dispute_opened(move |ev| {
        info!("🪝️ Dispute opened on order #{}", ev.order.id);
        disputed_copy.called();
        async {}.boxed()
    });
    let handlers = EventHandlers::new(10, hooks);
    let producers = handlers.producers();

    let (db, parties) = setup().await;
    let quote_flow = QuoteFlowApi::new(db.clone(), Default::default());
    let rfq = quote_flow.create_rfq(widget_rfq(parties.buyer.id)).await.unwrap();
    let quote = quote_flow
        .submit_quote(NewQuote::new(rfq.id, parties.supplier_a.id, Money::from_units(4200), 14))
        .await
        .unwrap();
    let decided = quote_flow.decide_quote(quote.id, QuoteDecision::Accepted, parties.buyer.id).await.unwrap();
    let DecidedQuote::Accepted(bundle) = decided else { panic!("Expected an acceptance") };

    let qc = QcApi::new(db.clone(), producers, 70);
    // First report fails and opens a dispute; the second (re-inspection) passes and pays out
    let failing = NewQcReport::new(bundle.order.id, 40).with_photos(vec!["torn-packaging.jpg".into()]);
    qc.submit_report(failing).await.unwrap();
    let passing = NewQcReport::new(bundle.order.id, 88).with_videos(vec!["unboxing.mp4".into()]);
    qc.submit_report(passing).await.unwrap();

    drop(qc);
    handlers.start_handlers().await;
    tokio::time::sleep(tokio::time::Duration::from_millis(250)).await;

    assert_eq!(completed.count(), 2);
    assert_eq!(released.count(), 1);
    assert_eq!(disputed.count(), 1);
    tear_down(db).await;
}
