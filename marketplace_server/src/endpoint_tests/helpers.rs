use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use chrono::{DateTime, Utc};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
};
use log::debug;

use crate::{auth::JwtClaims, middleware::JwtMiddlewareFactory};

// Creates a test signing key for issuing tokens. DO NOT re-use this key anywhere.
pub fn get_test_key() -> Hs256Key {
    Hs256Key::new(b"test-signing-key-0123456789abcdef-do-not-reuse")
}

pub fn issue_token(claims: JwtClaims, expiry: DateTime<Utc>) -> String {
    let header = Header::empty().with_token_type("JWT");
    let mut claims = Claims::new(claims);
    claims.expiration = Some(expiry);
    Hs256.token(&header, &claims, &get_test_key()).expect("Failed to sign token")
}

pub async fn get_request(
    auth_header: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::get().uri(path);
    if !auth_header.is_empty() {
        req = req.insert_header(("tms_access_token", auth_header));
    }
    send_request(req, configure).await
}

pub async fn get_request_with_bearer(
    token: &str,
    path: &str,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let req = TestRequest::get().uri(path).insert_header(("Authorization", format!("Bearer {token}")));
    send_request(req, configure).await
}

pub async fn post_request(
    auth_header: &str,
    path: &str,
    body: serde_json::Value,
    configure: fn(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::post().uri(path).set_json(&body);
    if !auth_header.is_empty() {
        req = req.insert_header(("tms_access_token", auth_header));
    }
    send_request(req, configure).await
}

async fn send_request(req: TestRequest, configure: fn(&mut ServiceConfig)) -> Result<(StatusCode, String), String> {
    let req = req.to_request();
    let app = App::new().wrap(JwtMiddlewareFactory::new(get_test_key())).configure(configure);

    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
