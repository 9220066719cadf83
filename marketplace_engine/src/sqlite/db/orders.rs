use sqlx::SqliteConnection;

use crate::{
    db_types::{Order, OrderStatus, Transaction},
    traits::MarketplaceError,
};

/// Creates the order record for a freshly created transaction. Orders start in `Confirmed` status.
pub async fn insert_order(tx: &Transaction, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                transaction_id,
                rfq_id,
                buyer_id,
                supplier_id
            ) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(tx.id)
    .bind(tx.rfq_id)
    .bind(tx.buyer_id)
    .bind(tx.supplier_id)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_by_transaction(
    transaction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub(crate) async fn update_order_status(
    id: i64,
    status: OrderStatus,
    conn: &mut SqliteConnection,
) -> Result<Order, MarketplaceError> {
    let status = status.to_string();
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or(MarketplaceError::OrderNotFound(id))
}
