use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
};
use futures_util::future::{Ready, ok, ready};
use log::{debug, warn};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use uuid::Uuid;

use crate::services::auth::jwt;

/// User id resolved from a validated bearer token, available to handlers via
/// request extensions.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

impl actix_web::FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<UserId>().copied() {
            Some(user_id) => ready(Ok(user_id)),
            None => {
                warn!(
                    "UserId missing from request extensions for path: {}",
                    req.path()
                );
                ready(Err(actix_web::error::ErrorUnauthorized(
                    "Not authenticated",
                )))
            }
        }
    }
}

/// Authentication middleware validating bearer JWTs issued by this server
/// and inserting the resolved `UserId` into request extensions.
#[derive(Clone, Default)]
pub struct SecureAuthentication;

impl<S, B> Transform<S, ServiceRequest> for SecureAuthentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SecureAuthenticationMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(SecureAuthenticationMiddleware {
            service: Arc::new(service),
        })
    }
}

#[derive(Clone)]
pub struct SecureAuthenticationMiddleware<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for SecureAuthenticationMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();

        // CORS pre-flight never carries credentials
        if req.method() == actix_web::http::Method::OPTIONS {
            return Box::pin(service.call(req));
        }

        let auth_str = match req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        {
            Some(s) => s.to_string(),
            None => {
                warn!("Missing Authorization header for path: {}", path);
                return Box::pin(ready(Err(Error::from(
                    actix_web::error::ErrorUnauthorized("Missing Authorization header"),
                ))));
            }
        };

        let token = match auth_str.strip_prefix("Bearer ") {
            Some(t) => t.to_string(),
            None => {
                warn!("Authorization header is not a Bearer token for path: {}", path);
                return Box::pin(ready(Err(Error::from(
                    actix_web::error::ErrorUnauthorized(
                        "Invalid Authorization format, expected Bearer token",
                    ),
                ))));
            }
        };

        let user_id = match jwt::validate_token(&token)
            .and_then(|claims| jwt::user_id_from_claims(&claims))
        {
            Ok(user_id) => user_id,
            Err(e) => {
                warn!("Token validation failed for path {}: {}", path, e);
                return Box::pin(ready(Err(Error::from(
                    actix_web::error::ErrorUnauthorized("Invalid or expired token"),
                ))));
            }
        };

        debug!("Authenticated user {} for path: {}", user_id, path);
        req.extensions_mut().insert(UserId(user_id));

        Box::pin(service.call(req))
    }
}
