//! Shared data types for the marketplace settlement engine.
//!
//! These types map 1:1 onto database rows (via `sqlx::FromRow`) and are also the wire format for the server's JSON
//! responses. Status enums are stored as their variant names in TEXT columns.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;
use tms_common::{Money, DEFAULT_CURRENCY_CODE};

#[derive(Debug, Clone, Error)]
#[error("Invalid value for {0}: {1}")]
pub struct ConversionError(pub &'static str, pub String);

//--------------------------------------      RfqStatus      ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum RfqStatus {
    /// The RFQ is accepting quotes and none have arrived yet.
    Open,
    /// At least one quote has been submitted. Still accepting further quotes.
    Quoted,
    /// A quote has been accepted (or the RFQ expired). No further quotes are accepted. Terminal.
    Closed,
}

impl RfqStatus {
    /// Open and Quoted RFQs both accept new quotes; only `Closed` is terminal.
    pub fn accepts_quotes(&self) -> bool {
        matches!(self, RfqStatus::Open | RfqStatus::Quoted)
    }
}

impl Display for RfqStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RfqStatus::Open => write!(f, "Open"),
            RfqStatus::Quoted => write!(f, "Quoted"),
            RfqStatus::Closed => write!(f, "Closed"),
        }
    }
}

impl FromStr for RfqStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Open" => Ok(Self::Open),
            "Quoted" => Ok(Self::Quoted),
            "Closed" => Ok(Self::Closed),
            s => Err(ConversionError("RfqStatus", s.to_string())),
        }
    }
}

impl From<String> for RfqStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid RFQ status: {value}. But this conversion cannot fail. Defaulting to Open");
            RfqStatus::Open
        })
    }
}

//--------------------------------------     QuoteStatus     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum QuoteStatus {
    /// Submitted and awaiting the buyer's decision.
    Pending,
    /// The buyer accepted this quote. Terminal.
    Accepted,
    /// The buyer rejected this quote. Terminal.
    Rejected,
}

impl Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuoteStatus::Pending => write!(f, "Pending"),
            QuoteStatus::Accepted => write!(f, "Accepted"),
            QuoteStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl FromStr for QuoteStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Accepted" => Ok(Self::Accepted),
            "Rejected" => Ok(Self::Rejected),
            s => Err(ConversionError("QuoteStatus", s.to_string())),
        }
    }
}

//--------------------------------------    QuoteDecision    ----------------------------------------------------------
/// The buyer's decision on a pending quote, as supplied in the PATCH body. Parsing is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteDecision {
    Accepted,
    Rejected,
}

impl FromStr for QuoteDecision {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ConversionError("QuoteDecision", s.to_string())),
        }
    }
}

//--------------------------------------     OrderStatus     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order has been created from an accepted quote and is awaiting fulfillment.
    Confirmed,
    /// Quality control passed and the goods are considered delivered.
    Delivered,
    /// Quality control failed; the order is in dispute.
    Disputed,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Confirmed => write!(f, "Confirmed"),
            OrderStatus::Delivered => write!(f, "Delivered"),
            OrderStatus::Disputed => write!(f, "Disputed"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Confirmed" => Ok(Self::Confirmed),
            "Delivered" => Ok(Self::Delivered),
            "Disputed" => Ok(Self::Disputed),
            s => Err(ConversionError("OrderStatus", s.to_string())),
        }
    }
}

//--------------------------------------    EscrowStatus     ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum EscrowStatus {
    /// The buyer's funds have been deposited against the order.
    Funded,
    /// Funds are held pending release (equivalent to `Funded` for release gating).
    Held,
    /// Funds have been paid out to the supplier. Terminal.
    Released,
    /// The escrow is frozen pending dispute resolution.
    Disputed,
}

impl EscrowStatus {
    pub fn is_releasable(&self) -> bool {
        matches!(self, EscrowStatus::Funded | EscrowStatus::Held)
    }
}

impl Display for EscrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EscrowStatus::Funded => write!(f, "Funded"),
            EscrowStatus::Held => write!(f, "Held"),
            EscrowStatus::Released => write!(f, "Released"),
            EscrowStatus::Disputed => write!(f, "Disputed"),
        }
    }
}

impl FromStr for EscrowStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Funded" => Ok(Self::Funded),
            "Held" => Ok(Self::Held),
            "Released" => Ok(Self::Released),
            "Disputed" => Ok(Self::Disputed),
            s => Err(ConversionError("EscrowStatus", s.to_string())),
        }
    }
}

//--------------------------------------  TransactionStatus  ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// The commercial record exists and the funds are held.
    Held,
    /// The buyer (or the QC flow) released the funds. Terminal.
    Released,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Held => write!(f, "Held"),
            TransactionStatus::Released => write!(f, "Released"),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Held" => Ok(Self::Held),
            "Released" => Ok(Self::Released),
            s => Err(ConversionError("TransactionStatus", s.to_string())),
        }
    }
}

//--------------------------------------      QcStatus       ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum QcStatus {
    Passed,
    Failed,
}

impl QcStatus {
    /// Derive a verdict from a numeric score. The threshold is inclusive: `score >= threshold` passes.
    pub fn from_score(score: i64, threshold: i64) -> Self {
        if score >= threshold {
            QcStatus::Passed
        } else {
            QcStatus::Failed
        }
    }
}

impl Display for QcStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QcStatus::Passed => write!(f, "Passed"),
            QcStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for QcStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Passed" => Ok(Self::Passed),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError("QcStatus", s.to_string())),
        }
    }
}

//--------------------------------------        Roles        ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum Role {
    /// Any authenticated user.
    User,
    /// May own RFQs, decide quotes and release held transactions.
    Buyer,
    /// May submit quotes against open RFQs.
    Supplier,
    /// Admin: read access to every record on the system.
    ReadAll,
    /// Admin: mutating access on behalf of other users.
    Write,
    SuperAdmin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Buyer => write!(f, "Buyer"),
            Role::Supplier => write!(f, "Supplier"),
            Role::ReadAll => write!(f, "ReadAll"),
            Role::Write => write!(f, "Write"),
            Role::SuperAdmin => write!(f, "SuperAdmin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Self::User),
            "Buyer" => Ok(Self::Buyer),
            "Supplier" => Ok(Self::Supplier),
            "ReadAll" => Ok(Self::ReadAll),
            "Write" => Ok(Self::Write),
            "SuperAdmin" => Ok(Self::SuperAdmin),
            s => Err(ConversionError("Role", s.to_string())),
        }
    }
}

/// The set of roles attached to a user or a token. `SuperAdmin` implies every other role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles(Vec<Role>);

impl Roles {
    pub fn new(roles: Vec<Role>) -> Self {
        Self(roles)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role) || self.0.contains(&Role::SuperAdmin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Role> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Role] {
        &self.0
    }
}

impl From<Vec<Role>> for Roles {
    fn from(roles: Vec<Role>) -> Self {
        Self(roles)
    }
}

//--------------------------------------        User         ----------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Login credential checked by the `/auth` endpoint. Issuing and rotating keys is out of scope.
    pub api_key: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------      Supplier       ----------------------------------------------------------
/// The supplier profile attached to a user account. Users without one cannot submit quotes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub user_id: i64,
    pub company_name: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------         Rfq         ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Rfq {
    pub id: i64,
    pub buyer_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub budget: Money,
    pub currency: String,
    pub status: RfqStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRfq {
    pub buyer_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub budget: Money,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}

impl NewRfq {
    pub fn new<S: Into<String>>(buyer_id: i64, title: S, budget: Money) -> Self {
        Self {
            buyer_id,
            title: title.into(),
            description: None,
            category: None,
            budget,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            expires_at: None,
        }
    }
}

//--------------------------------------        Quote        ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub rfq_id: i64,
    pub supplier_id: i64,
    pub price: Money,
    pub currency: String,
    pub lead_time_days: i64,
    pub notes: Option<String>,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuote {
    pub rfq_id: i64,
    pub supplier_id: i64,
    pub price: Money,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub lead_time_days: i64,
    pub notes: Option<String>,
}

impl NewQuote {
    pub fn new(rfq_id: i64, supplier_id: i64, price: Money, lead_time_days: i64) -> Self {
        Self {
            rfq_id,
            supplier_id,
            price,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            lead_time_days,
            notes: None,
        }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

//--------------------------------------     Transaction     ----------------------------------------------------------
/// The immutable commercial record of a deal, created exactly once when a quote is accepted.
/// The only mutation permitted afterwards is the buyer's `Held` → `Released` status change.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub rfq_id: i64,
    pub quote_id: i64,
    pub buyer_id: i64,
    pub supplier_id: i64,
    pub amount: Money,
    pub currency: String,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Order        ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub transaction_id: i64,
    pub rfq_id: i64,
    pub buyer_id: i64,
    pub supplier_id: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     EscrowAccount   ----------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EscrowAccount {
    pub id: i64,
    pub order_id: i64,
    pub amount: Money,
    pub currency: String,
    pub status: EscrowStatus,
    pub qc_passed: bool,
    pub released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       QcReport      ----------------------------------------------------------
/// Append-only inspection record for an order. Never mutated once written.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QcReport {
    pub id: i64,
    pub order_id: i64,
    pub photos: Json<Vec<String>>,
    pub videos: Json<Vec<String>>,
    pub notes: Option<String>,
    pub score: i64,
    pub status: QcStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQcReport {
    pub order_id: i64,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    pub notes: Option<String>,
    pub score: i64,
    /// Explicit verdict override. When absent, the verdict is derived from the score.
    pub status: Option<QcStatus>,
}

impl NewQcReport {
    pub fn new(order_id: i64, score: i64) -> Self {
        Self { order_id, photos: Vec::new(), videos: Vec::new(), notes: None, score, status: None }
    }

    pub fn with_photos(mut self, photos: Vec<String>) -> Self {
        self.photos = photos;
        self
    }

    pub fn with_videos(mut self, videos: Vec<String>) -> Self {
        self.videos = videos;
        self
    }

    /// At least one photo or video is required as inspection evidence.
    pub fn has_evidence(&self) -> bool {
        !self.photos.is_empty() || !self.videos.is_empty()
    }
}

//--------------------------------------    AcceptedQuote    ----------------------------------------------------------
/// The result of the atomic quote-acceptance unit: the closed RFQ, the accepted quote, the commercial record and the
/// fulfillment order with its funded escrow account.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedQuote {
    pub rfq: Rfq,
    pub quote: Quote,
    pub transaction: Transaction,
    pub order: Order,
    pub escrow: EscrowAccount,
}
