use log::trace;
use sqlx::SqliteConnection;
use tms_common::Money;

use crate::db_types::EscrowAccount;

/// Funds the escrow account for a new order. The amount is locked in against the order until release.
pub async fn insert_escrow(
    order_id: i64,
    amount: Money,
    currency: &str,
    conn: &mut SqliteConnection,
) -> Result<EscrowAccount, sqlx::Error> {
    let escrow = sqlx::query_as(
        r#"
            INSERT INTO escrow_accounts (
                order_id,
                amount,
                currency
            ) VALUES ($1, $2, $3)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(amount.value())
    .bind(currency)
    .fetch_one(conn)
    .await?;
    Ok(escrow)
}

pub async fn fetch_escrow_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<EscrowAccount>, sqlx::Error> {
    let escrow = sqlx::query_as("SELECT * FROM escrow_accounts WHERE order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(escrow)
}

/// Releases the escrow for an order. The update only fires while the funds are still held ('Funded' or 'Held'), so a
/// second release is a no-op and returns `None`. Released funds are never clawed back.
pub async fn release_escrow(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<EscrowAccount>, sqlx::Error> {
    let escrow = sqlx::query_as(
        "UPDATE escrow_accounts SET status = 'Released', released_at = CURRENT_TIMESTAMP, updated_at = \
         CURRENT_TIMESTAMP WHERE order_id = $1 AND status IN ('Funded', 'Held') RETURNING *",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    trace!("💰️ release_escrow for order #{order_id}: released = {}", escrow.is_some());
    Ok(escrow)
}

/// Records that the order's escrow was settled off the back of a passing QC report.
pub async fn set_qc_passed(order_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE escrow_accounts SET qc_passed = 1, updated_at = CURRENT_TIMESTAMP WHERE order_id = $1")
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}
