//! JWT validation middleware.
//!
//! Wraps the `/api` scope. Every request must carry a valid access token, either in the `tms_access_token` header or
//! as a standard `Authorization: Bearer` header. The token is validated against the server's signing key and the
//! embedded [`JwtClaims`] are stashed in the request extensions for the ACL middleware and the `JwtClaims` extractor
//! to pick up.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use jwt_compact::alg::Hs256Key;

use crate::{
    auth::{validate_access_token, ACCESS_TOKEN_HEADER},
    errors::ServerError,
};

pub struct JwtMiddlewareFactory {
    key: Hs256Key,
}

impl JwtMiddlewareFactory {
    pub fn new(key: Hs256Key) -> Self {
        JwtMiddlewareFactory { key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtMiddlewareService { key: self.key.clone(), service: Rc::new(service) })
    }
}

/// The dedicated header wins when both are present.
fn extract_token(req: &ServiceRequest) -> Option<&str> {
    if let Some(token) = req.headers().get(ACCESS_TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(token);
    }
    req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).and_then(|v| v.strip_prefix("Bearer "))
}

pub struct JwtMiddlewareService<S> {
    key: Hs256Key,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let key = self.key.clone();
        Box::pin(async move {
            let token = extract_token(&req).ok_or(ServerError::CouldNotDeserializeAccessToken)?.to_string();
            let claims = validate_access_token(&token, &key).map_err(|e| {
                log::debug!("🔐️ Access token rejected. {e}");
                ServerError::AuthenticationError(e)
            })?;
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
