//! Bearer-token authentication middleware for the Atrium server.
//! This middleware wraps the protected scope, so no protected route is reachable without it.
//!
//! It reads the `Authorization: Bearer <token>` header, verifies the token cryptographically
//! and, when a session store is configured, checks that the backing session record is still
//! live. On success the verified claims are bound into the request extensions for the ACL
//! middleware and the handlers; on any failure the request is rejected with a 401 before a
//! downstream handler is invoked. This is the only place a principal is constructed from raw
//! request data.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error,
    HttpMessage,
};
use atrium_accounts::{SessionApi, SessionManagement};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::{debug, warn};

use crate::{
    auth::TokenVerifier,
    errors::{AuthError, ServerError},
};

pub struct AuthMiddlewareFactory<B> {
    verifier: Rc<TokenVerifier>,
    sessions: Rc<Option<SessionApi<B>>>,
}

impl<B> AuthMiddlewareFactory<B> {
    /// When `sessions` is `None`, session tracking is disabled and verification is purely
    /// cryptographic.
    pub fn new(verifier: TokenVerifier, sessions: Option<SessionApi<B>>) -> Self {
        AuthMiddlewareFactory { verifier: Rc::new(verifier), sessions: Rc::new(sessions) }
    }
}

impl<S, B, Db> Transform<S, ServiceRequest> for AuthMiddlewareFactory<Db>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    Db: SessionManagement + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AuthMiddlewareService<S, Db>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddlewareService {
            verifier: Rc::clone(&self.verifier),
            sessions: Rc::clone(&self.sessions),
            service: Rc::new(service),
        })
    }
}

pub struct AuthMiddlewareService<S, Db> {
    verifier: Rc<TokenVerifier>,
    sessions: Rc<Option<SessionApi<Db>>>,
    service: Rc<S>,
}

impl<S, B, Db> Service<ServiceRequest> for AuthMiddlewareService<S, Db>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    Db: SessionManagement + 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let verifier = Rc::clone(&self.verifier);
        let sessions = Rc::clone(&self.sessions);
        Box::pin(async move {
            let token = match bearer_token(&req) {
                Ok(token) => token,
                Err(e) => return Err(ServerError::from(e).into()),
            };
            let claims = match verifier.verify(token) {
                Ok(claims) => claims,
                Err(e) => {
                    debug!("🔐️ Token verification failed. {e:?}");
                    return Err(ServerError::from(e).into());
                },
            };
            if let Some(api) = &*sessions {
                let record = api.fetch_session(&claims.jti).await.map_err(|e| {
                    warn!("🔐️ Could not reach the session store. {e}");
                    ServerError::StoreUnavailable(e.to_string())
                })?;
                // A token whose record is missing, revoked or expired is dead, even though it
                // still verifies cryptographically.
                if !record.map(|s| s.is_live()).unwrap_or(false) {
                    debug!("🔐️ No live session backs token {}", claims.jti);
                    return Err(ServerError::from(AuthError::SessionRevoked).into());
                }
            }
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Result<String, AuthError> {
    let header = req.headers().get(header::AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header.to_str().map_err(|e| AuthError::PoorlyFormattedToken(format!("{e}")))?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .ok_or_else(|| AuthError::PoorlyFormattedToken("expected a Bearer token".to_string()))
}
