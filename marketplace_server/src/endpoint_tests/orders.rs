use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Days, TimeZone, Utc};
use marketplace_engine::{
    db_types::{EscrowAccount, EscrowStatus, Order, OrderStatus, Role, Roles, Supplier},
    QueryApi,
};
use tms_common::Money;

use super::{
    helpers::{get_request, issue_token},
    mocks::MockQueryManager,
};
use crate::{auth::JwtClaims, routes::OrderByIdRoute};

const BUYER_ID: i64 = 42;
const SUPPLIER_USER_ID: i64 = 77;

#[actix_web::test]
async fn the_buyer_sees_their_own_order() {
    let _ = env_logger::try_init().ok();
    let token = valid_token(BUYER_ID, vec![Role::User, Role::Buyer]);
    let (status, body) = get_request(&token, "/orders/10", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""order":{"id":10"#), "was: {body}");
    assert!(body.contains(r#""escrow":{"id":4"#), "was: {body}");
}

#[actix_web::test]
async fn the_supplier_sees_the_order_too() {
    let _ = env_logger::try_init().ok();
    let token = valid_token(SUPPLIER_USER_ID, vec![Role::User, Role::Supplier]);
    let (status, _body) = get_request(&token, "/orders/10", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn a_stranger_is_not_an_order_party() {
    let _ = env_logger::try_init().ok();
    let token = valid_token(999, vec![Role::User]);
    let (status, body) = get_request(&token, "/orders/10", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Caller is not a party to this order"}"#);
}

#[actix_web::test]
async fn admins_see_any_order() {
    let _ = env_logger::try_init().ok();
    let token = valid_token(999, vec![Role::User, Role::ReadAll]);
    let (status, _body) = get_request(&token, "/orders/10", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn a_missing_order_is_not_found() {
    let _ = env_logger::try_init().ok();
    let token = valid_token(BUYER_ID, vec![Role::User]);
    let (status, body) = get_request(&token, "/orders/999", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. Order 999 does not exist"}"#);
}

fn valid_token(user_id: i64, roles: Vec<Role>) -> String {
    issue_token(JwtClaims { user_id, roles: Roles::new(roles) }, Utc::now() + Days::new(1))
}

fn configure(cfg: &mut ServiceConfig) {
    let mut query_manager = MockQueryManager::new();
    query_manager.expect_fetch_order().returning(|id| if id == 10 { Ok(Some(order_response())) } else { Ok(None) });
    query_manager.expect_fetch_escrow_for_order().returning(|_| Ok(Some(escrow_response())));
    query_manager.expect_fetch_supplier_for_user().returning(|user_id| {
        if user_id == SUPPLIER_USER_ID {
            Ok(Some(Supplier {
                id: 3,
                user_id: SUPPLIER_USER_ID,
                company_name: "Bob's Widgets".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            }))
        } else {
            Ok(None)
        }
    });
    let query_api = QueryApi::new(query_manager);
    cfg.service(OrderByIdRoute::<MockQueryManager>::new()).app_data(web::Data::new(query_api));
}

fn order_response() -> Order {
    Order {
        id: 10,
        transaction_id: 6,
        rfq_id: 1,
        buyer_id: BUYER_ID,
        supplier_id: 3,
        status: OrderStatus::Confirmed,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 30, 0).unwrap(),
    }
}

fn escrow_response() -> EscrowAccount {
    EscrowAccount {
        id: 4,
        order_id: 10,
        amount: Money::from_units(4500),
        currency: "USD".to_string(),
        status: EscrowStatus::Funded,
        qc_passed: false,
        released_at: None,
        created_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 30, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 2, 29, 14, 30, 0).unwrap(),
    }
}
