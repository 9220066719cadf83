//! Sqlite database operations for authentication and role management.
//!
//! Generally clients should never call these methods directly, and prefer to use the [`crate::traits::AuthManagement`]
//! trait methods that are implemented on the [`crate::SqliteDatabase`] struct instead.

use std::collections::HashMap;

use log::{debug, error};
use sqlx::{QueryBuilder, Row, SqliteConnection};

use crate::{db_types::Role, traits::AuthApiError};

/// Verifies that the stored api key for the user matches the supplied one. A constant-time comparison is not needed
/// here since keys are high-entropy random strings.
pub async fn check_api_key(user_id: i64, api_key: &str, conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    let stored: Option<String> =
        sqlx::query_scalar("SELECT api_key FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    match stored {
        None => Err(AuthApiError::UserNotFound),
        Some(stored) if stored == api_key => Ok(()),
        Some(_) => Err(AuthApiError::InvalidApiKey),
    }
}

pub async fn upsert_nonce_for_user(
    user_id: i64,
    nonce: u64,
    conn: &mut SqliteConnection,
) -> Result<(), AuthApiError> {
    #[allow(clippy::cast_possible_wrap)]
    let nonce = nonce as i64;
    let res = sqlx::query(
        r#"INSERT INTO auth_log (user_id, last_nonce) VALUES ($1, $2) ON CONFLICT(user_id) DO
    UPDATE SET last_nonce = excluded.last_nonce"#,
    )
    .bind(user_id)
    .bind(nonce)
    .execute(conn)
    .await;
    debug!("{res:?}");
    res.map_err(|e| {
        if let sqlx::Error::Database(ref de) = e {
            if let Some(code) = de.code() {
                // TRIGGER on increasing nonce violation
                if code.as_ref() == "1811" {
                    return AuthApiError::InvalidNonce;
                }
            }
        }
        AuthApiError::from(e)
    })
    .and_then(|res| match res.rows_affected() {
        0 => Err(AuthApiError::UserNotFound),
        1 => Ok(()),
        _ => unreachable!("Updating auth log should only affect one row"),
    })
}

pub async fn roles_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Role>, AuthApiError> {
    let result = sqlx::query(
        r#"SELECT name FROM
            role_assignments LEFT JOIN roles ON role_assignments.role_id = roles.id
            WHERE user_id = $1"#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await
    .map_err(|e| AuthApiError::DatabaseError(e.to_string()))?;
    let roles = result
        .iter()
        .map(|r| {
            let name: String = r.get(0);
            name.parse::<Role>().map_err(|_| AuthApiError::DatabaseError(format!("Unknown role '{name}'")))
        })
        .collect::<Result<Vec<Role>, _>>()?;
    Ok(roles)
}

pub async fn user_has_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    if roles.is_empty() {
        return Ok(());
    }
    let role_strings = roles.iter().map(|r| format!("'{r}'")).collect::<Vec<String>>().join(",");
    let q = format!(
        r#"SELECT count(name) as "num_roles"
                FROM role_assignments LEFT JOIN roles ON role_assignments.role_id = roles.id
                WHERE user_id = $1 AND name IN ({role_strings})"#
    );
    #[allow(clippy::cast_possible_truncation)]
    let num_matching_roles = sqlx::query(&q).bind(user_id).fetch_one(conn).await?.get::<i64, usize>(0) as usize;
    if num_matching_roles == roles.len() {
        Ok(())
    } else {
        let n = roles.len().saturating_sub(num_matching_roles);
        Err(AuthApiError::RoleNotAllowed(n))
    }
}

async fn fetch_roles(conn: &mut SqliteConnection) -> Result<HashMap<Role, i64>, AuthApiError> {
    let result = sqlx::query("SELECT id, name FROM roles").fetch_all(conn).await?;
    let roles = result
        .iter()
        .map(|r| {
            let id: i64 = r.get(0);
            let name: String = r.get(1);
            name.parse::<Role>()
                .map(|role| (role, id))
                .map_err(|_| AuthApiError::DatabaseError(format!("Unknown role '{name}'")))
        })
        .collect::<Result<HashMap<_, _>, _>>()?;
    debug!("Fetched current roles table: {:?}", roles);
    Ok(roles)
}

pub async fn assign_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    if roles.is_empty() {
        return Ok(());
    }
    let all_roles = fetch_roles(conn).await?;

    let role_ids = roles
        .iter()
        .map(|r| {
            all_roles.get(r).copied().ok_or_else(|| AuthApiError::DatabaseError(format!("Role '{r}' is not seeded")))
        })
        .collect::<Result<Vec<i64>, _>>()?;

    let mut qb = QueryBuilder::new("INSERT OR IGNORE INTO role_assignments (user_id, role_id) VALUES ");
    let mut values = qb.separated(", ");
    for role_id in role_ids {
        values.push("(");
        values.push_bind_unseparated(user_id);
        values.push_unseparated(", ");
        values.push_bind_unseparated(role_id);
        values.push_unseparated(")");
    }
    let res = qb.build().execute(conn).await?;

    if res.rows_affected() <= roles.len() as u64 {
        Ok(())
    } else {
        error!("Expected to insert at most {} roles, but inserted {}", roles.len(), res.rows_affected());
        Err(AuthApiError::DatabaseError(
            "Inserted unexpected number of Roles. Report this to the developers".to_string(),
        ))
    }
}

pub async fn remove_roles(user_id: i64, roles: &[Role], conn: &mut SqliteConnection) -> Result<u64, AuthApiError> {
    let all_roles = fetch_roles(conn).await?;

    let role_ids = roles
        .iter()
        .filter_map(|r| all_roles.get(r).copied())
        .collect::<Vec<i64>>();
    if role_ids.is_empty() {
        return Ok(0);
    }

    let mut qb = QueryBuilder::new("DELETE FROM role_assignments WHERE user_id = ");
    qb.push_bind(user_id);
    qb.push(" AND role_id IN (");
    let mut values = qb.separated(", ");
    role_ids.iter().for_each(|id| {
        values.push_bind(*id);
    });
    qb.push(")");
    let res = qb.build().execute(conn).await?;

    Ok(res.rows_affected())
}
