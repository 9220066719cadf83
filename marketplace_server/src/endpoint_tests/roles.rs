use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{Days, Utc};
use marketplace_engine::{
    db_types::{Role, Roles},
    AuthApi,
};
use serde_json::json;

use super::{
    helpers::{issue_token, post_request},
    mocks::MockAuthManager,
};
use crate::{auth::JwtClaims, routes::UpdateRolesRoute};

#[actix_web::test]
async fn only_super_admins_may_update_roles() {
    let _ = env_logger::try_init().ok();
    let token = valid_token(vec![Role::User, Role::Write]);
    let err = post_request(&token, "/roles", request_body(), configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions");
}

#[actix_web::test]
async fn super_admins_grant_and_revoke_roles() {
    let _ = env_logger::try_init().ok();
    let token = valid_token(vec![Role::SuperAdmin]);
    let (status, body) = post_request(&token, "/roles", request_body(), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Roles updated for 1 users"}"#);
}

fn valid_token(roles: Vec<Role>) -> String {
    issue_token(JwtClaims { user_id: 1, roles: Roles::new(roles) }, Utc::now() + Days::new(1))
}

fn request_body() -> serde_json::Value {
    json!([{ "user_id": 5, "apply": ["Buyer"], "revoke": ["Write"] }])
}

fn configure(cfg: &mut ServiceConfig) {
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_assign_roles().withf(|id, roles| *id == 5 && roles == [Role::Buyer]).returning(|_, _| Ok(()));
    auth_manager.expect_remove_roles().withf(|id, roles| *id == 5 && roles == [Role::Write]).returning(|_, _| Ok(1));
    let auth_api = AuthApi::new(auth_manager);
    cfg.service(UpdateRolesRoute::<MockAuthManager>::new()).app_data(web::Data::new(auth_api));
}
