use marketplace_engine::{
    db_types::{EscrowAccount, Order, QcReport, Quote, Rfq, Role, Supplier, Transaction},
    query_objects::{RfqQuotes, TransactionQueryFilter},
    traits::{AuthApiError, AuthManagement, QueryApiError, QueryManagement},
};
use mockall::mock;

mock! {
    pub QueryManager {}
    impl QueryManagement for QueryManager {
        async fn fetch_rfq(&self, rfq_id: i64) -> Result<Option<Rfq>, QueryApiError>;
        async fn fetch_quote(&self, quote_id: i64) -> Result<Option<Quote>, QueryApiError>;
        async fn fetch_supplier_for_user(&self, user_id: i64) -> Result<Option<Supplier>, QueryApiError>;
        async fn fetch_supplier(&self, supplier_id: i64) -> Result<Option<Supplier>, QueryApiError>;
        async fn quotes_for_buyer(&self, buyer_id: i64) -> Result<Vec<RfqQuotes>, QueryApiError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, QueryApiError>;
        async fn fetch_order_for_transaction(&self, transaction_id: i64) -> Result<Option<Order>, QueryApiError>;
        async fn fetch_escrow_for_order(&self, order_id: i64) -> Result<Option<EscrowAccount>, QueryApiError>;
        async fn fetch_transaction(&self, transaction_id: i64) -> Result<Option<Transaction>, QueryApiError>;
        async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, QueryApiError>;
        async fn qc_reports_for_order(&self, order_id: i64) -> Result<Vec<QcReport>, QueryApiError>;
    }
}

mock! {
    pub AuthManager {}
    impl AuthManagement for AuthManager {
        async fn check_api_key(&self, user_id: i64, api_key: &str) -> Result<(), AuthApiError>;
        async fn upsert_nonce_for_user(&self, user_id: i64, nonce: u64) -> Result<(), AuthApiError>;
        async fn check_user_has_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;
        async fn fetch_roles_for_user(&self, user_id: i64) -> Result<Vec<Role>, AuthApiError>;
        async fn assign_roles(&self, user_id: i64, roles: &[Role]) -> Result<(), AuthApiError>;
        async fn remove_roles(&self, user_id: i64, roles: &[Role]) -> Result<u64, AuthApiError>;
    }
}
