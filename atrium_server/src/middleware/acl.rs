//! Access control list middleware for the Atrium server.
//! This middleware can be placed on any route or service, and must run after the authentication
//! middleware has bound the verified claims into the request.
//!
//! It checks the roles in the claims against the required roles for the route. If the caller
//! holds all of the required roles, the request is allowed to continue. Otherwise, a 403
//! Forbidden response is returned: the caller is authenticated, they just lack privilege. A
//! request with no claims at all (a misordered middleware chain) is also rejected with 403.
//! This gate fails closed; it never permits by default.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use atrium_accounts::db_types::Role;
use futures::{
    future::{ok, Ready},
    Future,
};
use log::{debug, warn};

use crate::{auth::JwtClaims, errors::ServerError};

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
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
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let jwt_claims = req.extensions().get::<JwtClaims>().cloned();
            match jwt_claims {
                None => {
                    warn!("No access token claims found in request extensions");
                    Err(ServerError::InsufficientPermissions("No authenticated principal".to_string()).into())
                },
                Some(claims) if required_roles.iter().all(|role| claims.roles.contains(role)) => {
                    service.call(req).await
                },
                Some(claims) => {
                    debug!("🔐️ {} does not hold the required roles for this route", claims.username);
                    Err(ServerError::InsufficientPermissions("Insufficient permissions".to_string()).into())
                },
            }
        })
    }
}
