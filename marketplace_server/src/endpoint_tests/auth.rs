use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::Utc;
use jwt_compact::{AlgorithmExt, Token, UntrustedToken};
use log::*;
use marketplace_engine::{db_types::Role, traits::AuthApiError, AuthApi};

use super::{helpers::get_test_key, mocks::*};
use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::ServerOptions,
    data_objects::LoginRequest,
    routes::AuthRoute,
};

#[actix_web::test]
async fn login_without_a_body() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/auth").to_request();
    let app = App::new().configure(configure_app(Ok(()), Ok(())));
    let app = test::init_service(app).await;
    let (_req, res) = test::call_service(&app, req).await.into_parts();
    assert!(res.status().is_client_error());
}

#[actix_web::test]
async fn login_with_valid_credentials() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(login_request(), Ok(()), Ok(())).await;
    assert!(status.is_success(), "was: {status} / {body}");
    let claims = validate_token(&body).unwrap();
    assert_eq!(claims.user_id, 42);
    assert!(claims.roles.contains(Role::User));
    assert!(claims.roles.contains(Role::Buyer));
}

#[actix_web::test]
async fn login_with_the_wrong_api_key() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(login_request(), Err(AuthApiError::InvalidApiKey), Ok(())).await;
    assert_eq!(status.as_u16(), StatusCode::UNAUTHORIZED.as_u16());
    assert_eq!(body, r#"{"error":"Authentication Error. Credential validation failed. Invalid api key"}"#);
}

#[actix_web::test]
async fn login_with_no_preexisting_user_account() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(login_request(), Err(AuthApiError::UserNotFound), Ok(())).await;
    assert_eq!(status.as_u16(), StatusCode::FORBIDDEN.as_u16());
    assert_eq!(body, r#"{"error":"Authentication Error. User account not found."}"#);
}

#[actix_web::test]
async fn login_with_a_replayed_nonce() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(login_request(), Ok(()), Err(AuthApiError::InvalidNonce)).await;
    assert_eq!(status.as_u16(), StatusCode::UNAUTHORIZED.as_u16());
    assert_eq!(
        body,
        r#"{"error":"Authentication Error. Credential validation failed. Nonce is not strictly increasing."}"#
    );
}

#[actix_web::test]
async fn login_with_disallowed_roles() {
    let _ = env_logger::try_init().ok();
    let mut request = login_request();
    request.roles = vec![Role::User, Role::SuperAdmin];
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_check_api_key().returning(|_, _| Ok(()));
    auth_manager.expect_upsert_nonce_for_user().returning(|_, _| Ok(()));
    auth_manager.expect_check_user_has_roles().returning(|_, _| Err(AuthApiError::RoleNotAllowed(1)));
    let (status, body) = post_request_with(request, auth_manager).await;
    assert_eq!(status.as_u16(), StatusCode::FORBIDDEN.as_u16());
    assert_eq!(
        body,
        r#"{"error":"Authentication Error. Insufficient Permissions. User requested at least 1 roles that are not allowed"}"#
    );
}

fn login_request() -> LoginRequest {
    LoginRequest { user_id: 42, api_key: "alice-key".to_string(), nonce: 1, roles: vec![Role::User, Role::Buyer] }
}

fn configure_app(
    api_key_result: Result<(), AuthApiError>,
    nonce_result: Result<(), AuthApiError>,
) -> impl FnOnce(&mut ServiceConfig) {
    let mut auth_manager = MockAuthManager::new();
    auth_manager.expect_check_api_key().return_const(api_key_result);
    auth_manager.expect_upsert_nonce_for_user().return_const(nonce_result);
    auth_manager.expect_check_user_has_roles().returning(|_, _| Ok(()));
    move |cfg| {
        let auth_api = AuthApi::new(auth_manager);
        let jwt_signer = TokenIssuer::new(&get_test_key());
        let options = ServerOptions { use_x_forwarded_for: false, use_forwarded: false };
        cfg.app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options))
            .service(AuthRoute::<MockAuthManager>::new());
    }
}

async fn post_request(
    request: LoginRequest,
    api_key_result: Result<(), AuthApiError>,
    nonce_result: Result<(), AuthApiError>,
) -> (StatusCode, String) {
    let req = TestRequest::post().uri("/auth").set_json(&request).to_request();
    let app = App::new().configure(configure_app(api_key_result, nonce_result));
    let app = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::call_service(&app, req).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

async fn post_request_with(request: LoginRequest, auth_manager: MockAuthManager) -> (StatusCode, String) {
    let req = TestRequest::post().uri("/auth").set_json(&request).to_request();
    let app = App::new().configure(move |cfg: &mut ServiceConfig| {
        let auth_api = AuthApi::new(auth_manager);
        let jwt_signer = TokenIssuer::new(&get_test_key());
        let options = ServerOptions { use_x_forwarded_for: false, use_forwarded: false };
        cfg.app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options))
            .service(AuthRoute::<MockAuthManager>::new());
    });
    let app = test::init_service(app).await;
    let (_, res) = test::call_service(&app, req).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}

fn validate_token(token: &str) -> Result<JwtClaims, String> {
    debug!("Validating token: {token}");
    let untrusted_token = UntrustedToken::new(token).map_err(|e| format!("Invalid token format: {e:?}"))?;
    let token: Token<JwtClaims> = jwt_compact::alg::Hs256
        .validator(&get_test_key())
        .validate(&untrusted_token)
        .map_err(|e| format!("Signature error: {e}"))?;
    let claims = token.claims();
    let expiry = claims.expiration.unwrap().signed_duration_since(Utc::now());
    assert!(expiry.num_hours() < 24 && expiry.num_hours() >= 23, "Expiry: {}", expiry.num_hours());
    Ok(claims.custom.clone())
}
