use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Days, TimeZone, Utc};
use log::debug;
use marketplace_engine::{
    db_types::{Quote, QuoteStatus, Rfq, RfqStatus, Role, Roles},
    query_objects::RfqQuotes,
    QueryApi,
};
use tms_common::Money;

use super::{
    helpers::{get_request, get_request_with_bearer, issue_token},
    mocks::MockQueryManager,
};
use crate::{auth::JwtClaims, routes::MyQuotesRoute};

#[actix_web::test]
async fn fetch_my_quotes_no_token() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/quotes/buyer", configure).await.expect_err("Expected error");
    assert_eq!(err, "Access token invalid or not provided");
}

#[actix_web::test]
async fn fetch_my_quotes_tampered_token() {
    let _ = env_logger::try_init().ok();
    let mut token = valid_token(vec![Role::Buyer]);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    debug!("Calling /quotes with invalid token {token}");
    let err = get_request(&token, "/quotes/buyer", configure).await.expect_err("Expected error");
    assert!(err.contains("Credential validation failed"), "was: {err}");
}

#[actix_web::test]
async fn fetch_my_quotes_without_the_buyer_role() {
    let _ = env_logger::try_init().ok();
    let token = valid_token(vec![Role::User]);
    let err = get_request(&token, "/quotes/buyer", configure).await.expect_err("Request should have failed");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn fetch_my_quotes() {
    let _ = env_logger::try_init().ok();
    let token = valid_token(vec![Role::Buyer]);
    let (status, body) = get_request(&token, "/quotes/buyer", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, QUOTES_JSON);
}

#[actix_web::test]
async fn a_bearer_header_works_too() {
    let _ = env_logger::try_init().ok();
    let token = valid_token(vec![Role::Buyer]);
    let (status, body) =
        get_request_with_bearer(&token, "/quotes/buyer", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, QUOTES_JSON);
}

fn valid_token(roles: Vec<Role>) -> String {
    issue_token(JwtClaims { user_id: 42, roles: Roles::new(roles) }, Utc::now() + Days::new(1))
}

fn configure(cfg: &mut ServiceConfig) {
    let mut query_manager = MockQueryManager::new();
    query_manager.expect_quotes_for_buyer().returning(move |_| Ok(quotes_response()));
    let query_api = QueryApi::new(query_manager);
    cfg.service(MyQuotesRoute::<MockQueryManager>::new()).app_data(web::Data::new(query_api));
}

// Mock response to `quotes_for_buyer`
fn quotes_response() -> Vec<RfqQuotes> {
    let rfq = Rfq {
        id: 1,
        buyer_id: 42,
        title: "500 industrial widgets".to_string(),
        description: None,
        category: None,
        budget: Money::from_units(5000),
        currency: "USD".to_string(),
        status: RfqStatus::Quoted,
        expires_at: None,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 13, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 0, 0).unwrap(),
    };
    let quote = Quote {
        id: 7,
        rfq_id: 1,
        supplier_id: 3,
        price: Money::from_units(4500),
        currency: "USD".to_string(),
        lead_time_days: 21,
        notes: None,
        status: QuoteStatus::Pending,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 0, 0).unwrap(),
    };
    vec![RfqQuotes::new(rfq, vec![quote])]
}

const QUOTES_JSON: &str = r#"[{"rfq":{"id":1,"buyer_id":42,"title":"500 industrial widgets","description":null,"category":null,"budget":500000,"currency":"USD","status":"Quoted","expires_at":null,"created_at":"2024-02-29T13:30:00Z","updated_at":"2024-02-29T14:00:00Z"},"quotes":[{"id":7,"rfq_id":1,"supplier_id":3,"price":450000,"currency":"USD","lead_time_days":21,"notes":null,"status":"Pending","created_at":"2024-02-29T14:00:00Z","updated_at":"2024-02-29T14:00:00Z"}]}]"#;
