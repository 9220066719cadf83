use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewRfq, Rfq},
    traits::MarketplaceError,
};

/// Inserts a new RFQ into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_rfq(rfq: NewRfq, conn: &mut SqliteConnection) -> Result<Rfq, MarketplaceError> {
    let rfq = sqlx::query_as(
        r#"
            INSERT INTO rfqs (
                buyer_id,
                title,
                description,
                category,
                budget,
                currency,
                expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(rfq.buyer_id)
    .bind(rfq.title)
    .bind(rfq.description)
    .bind(rfq.category)
    .bind(rfq.budget.value())
    .bind(rfq.currency)
    .bind(rfq.expires_at)
    .fetch_one(conn)
    .await?;
    Ok(rfq)
}

pub async fn fetch_rfq(rfq_id: i64, conn: &mut SqliteConnection) -> Result<Option<Rfq>, sqlx::Error> {
    let rfq = sqlx::query_as("SELECT * FROM rfqs WHERE id = $1").bind(rfq_id).fetch_optional(conn).await?;
    Ok(rfq)
}

/// All RFQs owned by the given buyer, oldest first.
pub async fn rfqs_for_buyer(buyer_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Rfq>, sqlx::Error> {
    let rfqs = sqlx::query_as("SELECT * FROM rfqs WHERE buyer_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(buyer_id)
        .fetch_all(conn)
        .await?;
    Ok(rfqs)
}

/// Flips an `Open` RFQ to `Quoted` when its first quote arrives. A no-op for RFQs already in `Quoted` status.
pub async fn mark_quoted(rfq_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let res = sqlx::query(
        "UPDATE rfqs SET status = 'Quoted', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = 'Open'",
    )
    .bind(rfq_id)
    .execute(conn)
    .await?;
    trace!("📋️ mark_quoted affected {} row(s) for RFQ #{rfq_id}", res.rows_affected());
    Ok(())
}

/// Atomically closes an RFQ so that a quote can be accepted against it.
///
/// The update only succeeds while the RFQ still accepts quotes ('Open' or 'Quoted'). When two acceptances race, only
/// one of them flips the row; the loser gets `None` back and must abort.
pub async fn close_rfq_for_acceptance(
    rfq_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Rfq>, sqlx::Error> {
    let rfq = sqlx::query_as(
        "UPDATE rfqs SET status = 'Closed', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status IN ('Open', \
         'Quoted') RETURNING *",
    )
    .bind(rfq_id)
    .fetch_optional(conn)
    .await?;
    Ok(rfq)
}
