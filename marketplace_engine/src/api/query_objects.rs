use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::db_types::{Quote, Rfq, TransactionStatus};

/// An RFQ together with every quote that has been submitted against it. This is the shape the buyer dashboard
/// consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfqQuotes {
    pub rfq: Rfq,
    pub quotes: Vec<Quote>,
}

impl RfqQuotes {
    pub fn new(rfq: Rfq, quotes: Vec<Quote>) -> Self {
        Self { rfq, quotes }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionQueryFilter {
    pub buyer_id: Option<i64>,
    pub supplier_id: Option<i64>,
    /// Restricts results to transactions the given user is a party to, either as the buyer, or through their
    /// supplier profile.
    pub for_user: Option<i64>,
    pub order_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Accepts either a list, or a comma-separated string such as `status=Held,Released`. Query strings can only
    /// carry the latter form.
    #[serde(default, deserialize_with = "status_list")]
    pub status: Option<Vec<TransactionStatus>>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl TransactionQueryFilter {
    pub fn with_buyer_id(mut self, buyer_id: i64) -> Self {
        self.buyer_id = Some(buyer_id);
        self
    }

    pub fn with_supplier_id(mut self, supplier_id: i64) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }

    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn for_user(mut self, user_id: i64) -> Self {
        self.for_user = Some(user_id);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.buyer_id.is_none() &&
            self.supplier_id.is_none() &&
            self.for_user.is_none() &&
            self.order_id.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.status.is_none()
    }
}

impl Display for TransactionQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(buyer_id) = &self.buyer_id {
            write!(f, "buyer_id: {buyer_id}. ")?;
        }
        if let Some(supplier_id) = &self.supplier_id {
            write!(f, "supplier_id: {supplier_id}. ")?;
        }
        if let Some(user_id) = &self.for_user {
            write!(f, "for_user: {user_id}. ")?;
        }
        if let Some(order_id) = &self.order_id {
            write!(f, "order_id: {order_id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if let Some(offset) = &self.offset {
            write!(f, "offset {offset}. ")?;
        }
        if let Some(limit) = &self.limit {
            write!(f, "limit {limit}. ")?;
        }
        Ok(())
    }
}

fn status_list<'de, D>(de: D) -> Result<Option<Vec<TransactionStatus>>, D::Error>
where D: Deserializer<'de> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StatusList {
        List(Vec<TransactionStatus>),
        Csv(String),
    }
    match Option::<StatusList>::deserialize(de)? {
        None => Ok(None),
        Some(StatusList::List(statuses)) => Ok(Some(statuses)),
        Some(StatusList::Csv(csv)) => csv
            .split(',')
            .map(|s| s.trim().parse::<TransactionStatus>().map_err(serde::de::Error::custom))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_filter_parses_both_wire_forms() {
        // The form a query string produces
        let filter: TransactionQueryFilter =
            serde_json::from_str(r#"{"status": "Held,Released", "limit": 10}"#).unwrap();
        assert_eq!(filter.status, Some(vec![TransactionStatus::Held, TransactionStatus::Released]));
        assert_eq!(filter.limit, Some(10));

        // The form a JSON client produces
        let filter: TransactionQueryFilter = serde_json::from_str(r#"{"status": ["Held"]}"#).unwrap();
        assert_eq!(filter.status, Some(vec![TransactionStatus::Held]));

        let filter: TransactionQueryFilter = serde_json::from_str(r#"{"buyer_id": 1}"#).unwrap();
        assert_eq!(filter.status, None);

        assert!(serde_json::from_str::<TransactionQueryFilter>(r#"{"status": "Pending"}"#).is_err());
    }
}
