//! JWT issuing and validation for the server.
//!
//! Clients call `POST /auth` with their user id, api key and a strictly increasing nonce. On success they receive a
//! signed HS256 access token carrying their user id and granted roles, which must accompany every `/api` request in
//! the `tms_access_token` header.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    Token,
    UntrustedToken,
};
use log::debug;
use marketplace_engine::db_types::Roles;
use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, ServerError};

pub const ACCESS_TOKEN_HEADER: &str = "tms_access_token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: i64,
    pub roles: Roles,
}

/// The claims extractor. The JWT middleware validates the access token and stashes the claims in the request
/// extensions, so handlers can simply take a `JwtClaims` parameter.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::CouldNotDeserializeAccessToken))
    }
}

pub fn validate_access_token(token: &str, key: &Hs256Key) -> Result<JwtClaims, AuthError> {
    let untrusted_token = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(format!("{e:?}")))?;
    let token: Token<JwtClaims> = Hs256
        .validator(key)
        .validate(&untrusted_token)
        .map_err(|e| AuthError::ValidationError(format!("{e}")))?;
    let claims = token.claims();
    if let Some(expiry) = claims.expiration {
        if expiry < Utc::now() {
            return Err(AuthError::ValidationError("Access token has expired".to_string()));
        }
    }
    debug!("🔐️ Access token validated for user #{}", claims.custom.user_id);
    Ok(claims.custom.clone())
}

#[derive(Clone)]
pub struct TokenIssuer {
    key: Hs256Key,
}

impl TokenIssuer {
    pub fn new(key: &Hs256Key) -> Self {
        Self { key: key.clone() }
    }

    /// Issue a new access token for the given claims.
    /// This method DOES NOT verify that the claims contain legitimate information. That must be done prior to calling
    /// `issue_token`.
    pub fn issue_token(&self, claims: JwtClaims, duration: Option<Duration>) -> Result<String, AuthError> {
        let header = Header::empty().with_token_type("JWT");
        let mut claims = Claims::new(claims);
        let duration = duration.unwrap_or_else(|| Duration::hours(24));
        claims.expiration = Some(Utc::now() + duration);
        let token =
            Hs256.token(&header, &claims, &self.key).map_err(|e| AuthError::ValidationError(format!("{e:?}")))?;
        Ok(token)
    }
}
