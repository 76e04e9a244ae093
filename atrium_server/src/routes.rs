//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module
//! neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the
//! current thread will cause the current worker to stop processing new requests. For this
//! reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be
//! expressed as futures or asynchronous functions. Async handlers get executed concurrently by
//! worker threads and thus don't block execution.

use actix_web::{get, web, HttpResponse, Responder};
use atrium_accounts::{
    db_types::{NewSessionRecord, Role, UserProfile},
    AccountApi,
    AuthApi,
    SessionApi,
    SessionApiError,
    SessionManagement,
    UserManagement,
};
use log::*;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    config::ServerOptions,
    data_objects::{JsonResponse, LoginRequest, LoginResponse, UpdatePasswordRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name);
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ where requires [$($roles:expr),+])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Login  ----------------------------------------------------
route!(login => Post "/auth" impl UserManagement, SessionManagement);
/// Route handler for the login endpoint
///
/// This route is used to authenticate a user and issue a signed access token.
///
/// Callers supply their username or email and their password in the JSON body. If the
/// credentials check out, the server returns the token, its expiry, and the user's profile.
/// When session tracking is enabled, a session record is written alongside the token so that it
/// can be revoked before its natural expiry.
///
/// An unknown identifier and a wrong password produce byte-for-byte identical responses (and
/// comparable latency), so this endpoint cannot be used to enumerate accounts.
pub async fn login<A>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<A>>,
    sessions: web::Data<SessionApi<A>>,
    signer: web::Data<TokenIssuer>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError>
where
    A: UserManagement + SessionManagement,
{
    trace!("💻️ Received login request");
    let LoginRequest { identifier, password } = body.into_inner();
    let user = api.authenticate(&identifier, password.reveal()).await.map_err(|e| {
        debug!("💻️ Login failed for {identifier}. {e}");
        ServerError::from(e)
    })?;
    let issued = signer.issue(&user, None)?;
    if options.session_tracking {
        let session = NewSessionRecord {
            token_id: issued.claims.jti.clone(),
            user_id: user.id,
            issued_at: issued.issued_at,
            expires_at: issued.expires_at,
        };
        sessions.create_session(session).await?;
    }
    debug!("💻️ Issued access token for {}", user.username);
    let response =
        LoginResponse { access_token: issued.token, expires_at: issued.expires_at, user: UserProfile::from(&user) };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Logout  ----------------------------------------------------
route!(logout => Post "/logout" impl SessionManagement);
/// Revokes the session backing the presented token. The token itself remains cryptographically
/// valid until it expires, but the auth middleware will reject it on the next request.
pub async fn logout<A: SessionManagement>(
    claims: JwtClaims,
    sessions: web::Data<SessionApi<A>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    if options.session_tracking {
        match sessions.revoke_session(&claims.jti).await {
            Ok(()) => {},
            Err(SessionApiError::SessionNotFound) => {
                debug!("💻️ Logout for {}: no session record for token {}", claims.username, claims.jti)
            },
            Err(e) => return Err(e.into()),
        }
    }
    debug!("💻️ {} logged out", claims.username);
    Ok(HttpResponse::Ok().json(JsonResponse::success("Logged out")))
}

//----------------------------------------------   Profile  ----------------------------------------------------
route!(my_profile => Get "/userinfo" impl UserManagement);
/// Returns the authenticated caller's profile. The identity comes from the verified claims, not
/// from any request parameter.
pub async fn my_profile<B: UserManagement>(
    claims: JwtClaims,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET userinfo for {}", claims.username);
    let profile = api
        .profile_for_user(claims.sub)
        .await
        .map_err(|e| {
            debug!("💻️ Could not fetch profile. {e}");
            ServerError::from(e)
        })?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No user with id {}", claims.sub)))?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(check_token => Get "/check_token");
/// Echoes the verified claims back to the caller. A cheap way for clients to check whether their
/// stored token is still good.
pub async fn check_token(claims: JwtClaims) -> HttpResponse {
    HttpResponse::Ok().json(claims)
}

//----------------------------------------------   Password  ----------------------------------------------------
route!(update_password => Patch "/users/password" impl UserManagement, SessionManagement);
/// Changes the caller's password. The old password must be supplied again, and every live
/// session belonging to the caller is revoked, including the one making this request.
pub async fn update_password<A>(
    claims: JwtClaims,
    body: web::Json<UpdatePasswordRequest>,
    api: web::Data<AuthApi<A>>,
) -> Result<HttpResponse, ServerError>
where
    A: UserManagement + SessionManagement,
{
    let UpdatePasswordRequest { old_password, new_password } = body.into_inner();
    let revoked =
        api.change_password(claims.sub, old_password.reveal(), new_password.reveal()).await.map_err(|e| {
            debug!("💻️ Password update failed for {}. {e}", claims.username);
            ServerError::from(e)
        })?;
    info!("💻️ {} changed their password. {revoked} session(s) revoked", claims.username);
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Password updated. {revoked} session(s) revoked"))))
}

//----------------------------------------------   Users (admin)  ----------------------------------------------------
route!(list_users => Get "/users" impl UserManagement where requires [Role::Admin]);
pub async fn list_users<B: UserManagement>(api: web::Data<AccountApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET users");
    let users = api.all_profiles().await.map_err(|e| {
        debug!("💻️ Could not fetch users. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(users))
}

route!(user_by_id => Get "/users/{id}" impl UserManagement where requires [Role::Admin]);
pub async fn user_by_id<B: UserManagement>(
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET user {id}");
    let profile = api
        .profile_for_user(id)
        .await
        .map_err(|e| {
            debug!("💻️ Could not fetch user {id}. {e}");
            ServerError::from(e)
        })?
        .ok_or_else(|| ServerError::NoRecordFound(format!("No user with id {id}")))?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(revoke_user_sessions => Delete "/users/{id}/sessions" impl SessionManagement where requires [Role::Admin]);
/// Admin-forced invalidation: revokes every live session belonging to the given user.
pub async fn revoke_user_sessions<B: SessionManagement>(
    path: web::Path<i64>,
    sessions: web::Data<SessionApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    let revoked = sessions.revoke_sessions_for_user(user_id).await.map_err(|e| {
        debug!("💻️ Could not revoke sessions for user {user_id}. {e}");
        ServerError::from(e)
    })?;
    info!("💻️ Admin revoked {revoked} session(s) for user {user_id}");
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{revoked} session(s) revoked"))))
}
