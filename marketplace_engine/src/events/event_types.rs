use serde::{Deserialize, Serialize};
use tms_common::Money;

use crate::db_types::{Order, QcReport, QcStatus, Quote, Rfq};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSubmittedEvent {
    pub rfq: Rfq,
    pub quote: Quote,
}

impl QuoteSubmittedEvent {
    pub fn new(rfq: Rfq, quote: Quote) -> Self {
        Self { rfq, quote }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteAcceptedEvent {
    pub rfq: Rfq,
    pub quote: Quote,
    pub order: Order,
}

impl QuoteAcceptedEvent {
    pub fn new(rfq: Rfq, quote: Quote, order: Order) -> Self {
        Self { rfq, quote, order }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QcCompletedEvent {
    pub order: Order,
    pub report: QcReport,
    pub buyer_user_id: i64,
    pub supplier_user_id: i64,
}

impl QcCompletedEvent {
    pub fn new(order: Order, report: QcReport, buyer_user_id: i64, supplier_user_id: i64) -> Self {
        Self { order, report, buyer_user_id, supplier_user_id }
    }

    pub fn status(&self) -> QcStatus {
        self.report.status
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReleasedEvent {
    pub transaction_id: i64,
    pub order_id: i64,
    pub supplier_user_id: i64,
    pub amount: Money,
}

impl PaymentReleasedEvent {
    pub fn new(transaction_id: i64, order_id: i64, supplier_user_id: i64, amount: Money) -> Self {
        Self { transaction_id, order_id, supplier_user_id, amount }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeOpenedEvent {
    pub order: Order,
    pub report: QcReport,
    pub buyer_user_id: i64,
    pub supplier_user_id: i64,
}

impl DisputeOpenedEvent {
    pub fn new(order: Order, report: QcReport, buyer_user_id: i64, supplier_user_id: i64) -> Self {
        Self { order, report, buyer_user_id, supplier_user_id }
    }
}
