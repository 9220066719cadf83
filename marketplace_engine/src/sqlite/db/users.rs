use sqlx::SqliteConnection;

use crate::db_types::{Supplier, User};

/// Creates a new user account with the given api key.
pub async fn insert_user(username: &str, api_key: &str, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as("INSERT INTO users (username, api_key) VALUES ($1, $2) RETURNING *")
        .bind(username)
        .bind(api_key)
        .fetch_one(conn)
        .await?;
    Ok(user)
}

pub async fn fetch_supplier(supplier_id: i64, conn: &mut SqliteConnection) -> Result<Option<Supplier>, sqlx::Error> {
    let supplier =
        sqlx::query_as("SELECT * FROM suppliers WHERE id = $1").bind(supplier_id).fetch_optional(conn).await?;
    Ok(supplier)
}

/// Resolves the supplier profile attached to a user account, if one exists.
pub async fn fetch_supplier_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Supplier>, sqlx::Error> {
    let supplier =
        sqlx::query_as("SELECT * FROM suppliers WHERE user_id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(supplier)
}

pub async fn insert_supplier(
    user_id: i64,
    company_name: &str,
    conn: &mut SqliteConnection,
) -> Result<Supplier, sqlx::Error> {
    let supplier = sqlx::query_as("INSERT INTO suppliers (user_id, company_name) VALUES ($1, $2) RETURNING *")
        .bind(user_id)
        .bind(company_name)
        .fetch_one(conn)
        .await?;
    Ok(supplier)
}
