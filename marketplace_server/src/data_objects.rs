use std::fmt::Display;

use marketplace_engine::db_types::{EscrowAccount, Order, QuoteDecision, Role};
use serde::{Deserialize, Serialize};

/// The JSON body for `POST /auth`.
///
/// The nonce must be strictly greater than any nonce this user has authenticated with before. A unix time epoch works
/// well. The requested roles become the claims on the issued token and every one of them must have been granted to
/// the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user_id: i64,
    pub api_key: String,
    pub nonce: u64,
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub user_id: i64,
    #[serde(default)]
    pub apply: Vec<Role>,
    #[serde(default)]
    pub revoke: Vec<Role>,
}

/// The JSON body for `PATCH /quotes/{id}`, e.g. `{"status": "accepted"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDecisionRequest {
    pub status: QuoteDecision,
}

/// The query string for `GET /qc/reports?order_id=`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcReportQuery {
    pub order_id: i64,
}

/// An order together with its escrow account, as returned by `GET /orders/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub order: Order,
    pub escrow: Option<EscrowAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}
