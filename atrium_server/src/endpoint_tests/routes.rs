use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use atrium_accounts::{AccountApi, SessionApi};

use super::{helpers::*, mocks::MockBackend};
use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::{AuthConfig, ServerOptions},
    middleware::AuthMiddlewareFactory,
    routes::{LogoutRoute, MyProfileRoute, RevokeUserSessionsRoute},
};

/// The session-backed routes, with session tracking on and no session guard on the middleware
/// (the revocation behaviour itself is covered by the middleware tests).
fn configure_app(
    verifier: TokenVerifier,
    sessions: MockBackend,
    accounts: MockBackend,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let scope = web::scope("/api")
            .wrap(AuthMiddlewareFactory::<MockBackend>::new(verifier, None))
            .service(LogoutRoute::<MockBackend>::new())
            .service(MyProfileRoute::<MockBackend>::new())
            .service(RevokeUserSessionsRoute::<MockBackend>::new());
        cfg.app_data(web::Data::new(SessionApi::new(sessions)))
            .app_data(web::Data::new(AccountApi::new(accounts)))
            .app_data(web::Data::new(ServerOptions { session_tracking: true }))
            .service(scope);
    }
}

#[actix_web::test]
async fn logout_revokes_the_presented_session() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::random();
    let issued = TokenIssuer::new(&config).issue(&test_user(1, "password123", false), None).unwrap();
    let jti = issued.claims.jti.clone();
    let mut sessions = MockBackend::new();
    sessions.expect_revoke_session().times(1).withf(move |token_id| *token_id == jti).returning(|_| Ok(()));

    let app =
        App::new().configure(configure_app(TokenVerifier::new(&config), sessions, MockBackend::new()));
    let app = test::init_service(app).await;
    let req = TestRequest::post()
        .uri("/api/logout")
        .insert_header(("Authorization", format!("Bearer {}", issued.token)))
        .to_request();
    let (status, body) = call_and_read(&app, req).await;
    assert!(status.is_success(), "was: {status} {body}");
    assert!(body.contains("Logged out"), "was: {body}");
}

#[actix_web::test]
async fn userinfo_returns_the_callers_own_profile() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::random();
    let issued = TokenIssuer::new(&config).issue(&test_user(42, "password123", false), None).unwrap();
    let mut accounts = MockBackend::new();
    accounts
        .expect_fetch_user_by_id()
        .withf(|id| *id == 42)
        .returning(|_| Ok(Some(test_user(42, "password123", false))));

    let app =
        App::new().configure(configure_app(TokenVerifier::new(&config), MockBackend::new(), accounts));
    let app = test::init_service(app).await;
    let req = TestRequest::get()
        .uri("/api/userinfo")
        .insert_header(("Authorization", format!("Bearer {}", issued.token)))
        .to_request();
    let (status, body) = call_and_read(&app, req).await;
    assert!(status.is_success(), "was: {status} {body}");
    assert!(body.contains("user42"), "was: {body}");
    assert!(!body.contains("argon2"), "profiles must not leak password hashes. was: {body}");
}

#[actix_web::test]
async fn admins_can_force_revoke_a_users_sessions() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::random();
    let issued = TokenIssuer::new(&config).issue(&test_user(1, "password123", true), None).unwrap();
    let mut sessions = MockBackend::new();
    sessions.expect_revoke_sessions_for_user().withf(|user_id| *user_id == 9).returning(|_| Ok(3));

    let app =
        App::new().configure(configure_app(TokenVerifier::new(&config), sessions, MockBackend::new()));
    let app = test::init_service(app).await;
    let req = TestRequest::delete()
        .uri("/api/users/9/sessions")
        .insert_header(("Authorization", format!("Bearer {}", issued.token)))
        .to_request();
    let (status, body) = call_and_read(&app, req).await;
    assert!(status.is_success(), "was: {status} {body}");
    assert!(body.contains("3 session(s) revoked"), "was: {body}");
}

#[actix_web::test]
async fn non_admins_cannot_force_revoke_sessions() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::random();
    let issued = TokenIssuer::new(&config).issue(&test_user(1, "password123", false), None).unwrap();

    let app = App::new()
        .configure(configure_app(TokenVerifier::new(&config), MockBackend::new(), MockBackend::new()));
    let app = test::init_service(app).await;
    let req = TestRequest::delete()
        .uri("/api/users/9/sessions")
        .insert_header(("Authorization", format!("Bearer {}", issued.token)))
        .to_request();
    let (status, _body) = call_and_read(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
