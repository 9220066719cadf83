use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::query_objects::TransactionQueryFilter,
    db_types::{Quote, Rfq, Transaction},
};

/// Creates the commercial record for an accepted quote. The transaction starts in `Held` status; the funds do not
/// move to the supplier until QC passes or the buyer releases them.
pub async fn insert_transaction(
    rfq: &Rfq,
    quote: &Quote,
    conn: &mut SqliteConnection,
) -> Result<Transaction, sqlx::Error> {
    let tx = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                rfq_id,
                quote_id,
                buyer_id,
                supplier_id,
                amount,
                currency
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(rfq.id)
    .bind(quote.id)
    .bind(rfq.buyer_id)
    .bind(quote.supplier_id)
    .bind(quote.price.value())
    .bind(quote.currency.as_str())
    .fetch_one(conn)
    .await?;
    Ok(tx)
}

pub async fn fetch_transaction(
    transaction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let tx = sqlx::query_as("SELECT * FROM transactions WHERE id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

/// Releases a held transaction. Returns `None` if the transaction is not in `Held` status.
pub async fn release_transaction(
    transaction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let tx = sqlx::query_as(
        "UPDATE transactions SET status = 'Released', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = \
         'Held' RETURNING *",
    )
    .bind(transaction_id)
    .fetch_optional(conn)
    .await?;
    Ok(tx)
}

/// Fetches transactions according to criteria specified in the `TransactionQueryFilter`.
///
/// Resulting transactions are ordered by `created_at` in descending order.
pub async fn search_transactions(
    query: TransactionQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM transactions
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(supplier_id) = query.supplier_id {
        where_clause.push("supplier_id = ");
        where_clause.push_bind_unseparated(supplier_id);
    }
    if let Some(user_id) = query.for_user {
        where_clause.push("(buyer_id = ");
        where_clause.push_bind_unseparated(user_id);
        where_clause.push_unseparated(" OR supplier_id IN (SELECT id FROM suppliers WHERE user_id = ");
        where_clause.push_bind_unseparated(user_id);
        where_clause.push_unseparated("))");
    }
    if let Some(order_id) = query.order_id {
        where_clause.push("id IN (SELECT transaction_id FROM orders WHERE id = ");
        where_clause.push_bind_unseparated(order_id);
        where_clause.push_unseparated(")");
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    if query.limit.is_some() || query.offset.is_some() {
        // SQLite will not accept OFFSET without LIMIT. -1 means no limit.
        builder.push(" LIMIT ");
        builder.push_bind(query.limit.unwrap_or(-1));
        if let Some(offset) = query.offset {
            builder.push(" OFFSET ");
            builder.push_bind(offset);
        }
    }

    trace!("💸️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Transaction>();
    let transactions = query.fetch_all(conn).await?;
    trace!("Result of search_transactions: {:?}", transactions.len());
    Ok(transactions)
}
