use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewQuote, Quote},
    traits::MarketplaceError,
};

/// Inserts a new quote. The `quotes` table carries a UNIQUE(rfq_id, supplier_id) constraint, so a second submission
/// from the same supplier surfaces as [`MarketplaceError::DuplicateQuote`] and the original quote stays untouched.
pub async fn insert_quote(quote: NewQuote, conn: &mut SqliteConnection) -> Result<Quote, MarketplaceError> {
    let rfq_id = quote.rfq_id;
    let supplier_id = quote.supplier_id;
    let quote: Quote = sqlx::query_as(
        r#"
            INSERT INTO quotes (
                rfq_id,
                supplier_id,
                price,
                currency,
                lead_time_days,
                notes
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(rfq_id)
    .bind(supplier_id)
    .bind(quote.price.value())
    .bind(quote.currency)
    .bind(quote.lead_time_days)
    .bind(quote.notes)
    .fetch_one(conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref de) = e {
            if let Some(code) = de.code() {
                // UNIQUE constraint violation
                if code.as_ref() == "2067" {
                    return MarketplaceError::DuplicateQuote { rfq_id, supplier_id };
                }
            }
        }
        MarketplaceError::from(e)
    })?;
    debug!("📨️ Quote #{} saved in the DB for RFQ #{rfq_id}", quote.id);
    Ok(quote)
}

pub async fn fetch_quote(quote_id: i64, conn: &mut SqliteConnection) -> Result<Option<Quote>, sqlx::Error> {
    let quote = sqlx::query_as("SELECT * FROM quotes WHERE id = $1").bind(quote_id).fetch_optional(conn).await?;
    Ok(quote)
}

/// All quotes submitted against an RFQ, oldest first.
pub async fn quotes_for_rfq(rfq_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Quote>, sqlx::Error> {
    let quotes = sqlx::query_as("SELECT * FROM quotes WHERE rfq_id = $1 ORDER BY created_at ASC, id ASC")
        .bind(rfq_id)
        .fetch_all(conn)
        .await?;
    Ok(quotes)
}

/// Marks a pending quote as accepted. Returns `None` if the quote has already been decided.
pub async fn mark_accepted(quote_id: i64, conn: &mut SqliteConnection) -> Result<Option<Quote>, sqlx::Error> {
    let quote = sqlx::query_as(
        "UPDATE quotes SET status = 'Accepted', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = 'Pending' \
         RETURNING *",
    )
    .bind(quote_id)
    .fetch_optional(conn)
    .await?;
    Ok(quote)
}

/// Marks a pending quote as rejected. Returns `None` if the quote has already been decided.
pub async fn mark_rejected(quote_id: i64, conn: &mut SqliteConnection) -> Result<Option<Quote>, sqlx::Error> {
    let quote = sqlx::query_as(
        "UPDATE quotes SET status = 'Rejected', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = 'Pending' \
         RETURNING *",
    )
    .bind(quote_id)
    .fetch_optional(conn)
    .await?;
    Ok(quote)
}
