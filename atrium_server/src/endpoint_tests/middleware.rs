use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use atrium_accounts::{
    db_types::{SessionRecord, UserProfile},
    AccountApi,
    SessionApi,
    SessionApiError,
};
use chrono::{Duration, Utc};

use super::{helpers::*, mocks::MockBackend};
use crate::{
    auth::{IssuedToken, JwtClaims, TokenIssuer, TokenVerifier},
    config::AuthConfig,
    middleware::AuthMiddlewareFactory,
    routes::{CheckTokenRoute, ListUsersRoute},
};

/// An `/api` scope with the auth middleware, a plain protected route and an admin-only route.
fn configure_app(
    verifier: TokenVerifier,
    session_guard: Option<MockBackend>,
    accounts: MockBackend,
) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let scope = web::scope("/api")
            .wrap(AuthMiddlewareFactory::new(verifier, session_guard.map(SessionApi::new)))
            .service(CheckTokenRoute::new())
            .service(ListUsersRoute::<MockBackend>::new());
        cfg.app_data(web::Data::new(AccountApi::new(accounts))).service(scope);
    }
}

async fn get_with_token(
    uri: &str,
    token: Option<&str>,
    verifier: TokenVerifier,
    session_guard: Option<MockBackend>,
    accounts: MockBackend,
) -> (StatusCode, String) {
    let _ = env_logger::try_init().ok();
    let app = App::new().configure(configure_app(verifier, session_guard, accounts));
    let app = test::init_service(app).await;
    let mut req = TestRequest::get().uri(uri);
    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    call_and_read(&app, req.to_request()).await
}

fn issue(config: &AuthConfig, user_id: i64, is_admin: bool) -> IssuedToken {
    TokenIssuer::new(config).issue(&test_user(user_id, "password123", is_admin), None).unwrap()
}

fn live_session(token: &IssuedToken) -> SessionRecord {
    SessionRecord {
        token_id: token.claims.jti.clone(),
        user_id: token.claims.sub,
        issued_at: token.issued_at,
        expires_at: token.expires_at,
        revoked: false,
    }
}

#[actix_web::test]
async fn requests_without_a_token_are_unauthorized() {
    let config = AuthConfig::random();
    let (status, body) =
        get_with_token("/api/check_token", None, TokenVerifier::new(&config), None, MockBackend::new()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("missing_token"), "was: {body}");
}

#[actix_web::test]
async fn non_bearer_schemes_are_rejected() {
    let _ = env_logger::try_init().ok();
    let config = AuthConfig::random();
    let app = App::new().configure(configure_app(TokenVerifier::new(&config), None, MockBackend::new()));
    let app = test::init_service(app).await;
    let req = TestRequest::get()
        .uri("/api/check_token")
        .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
        .to_request();
    let (status, body) = call_and_read(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("malformed_token"), "was: {body}");
}

#[actix_web::test]
async fn tampered_tokens_are_rejected() {
    let config = AuthConfig::random();
    let issued = issue(&config, 1, false);
    let mut tampered = issued.token.into_bytes();
    let mid = tampered.len() / 2;
    tampered[mid] ^= 0x01;
    let tampered = String::from_utf8_lossy(&tampered).into_owned();
    let (status, body) =
        get_with_token("/api/check_token", Some(&tampered), TokenVerifier::new(&config), None, MockBackend::new())
            .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!body.contains("expired_token"), "tampering must never read as expiry. was: {body}");
}

#[actix_web::test]
async fn expired_tokens_are_unauthorized_with_a_distinct_reason() {
    let config = AuthConfig::random();
    let issued = TokenIssuer::new(&config)
        .issue(&test_user(1, "password123", false), Some(Duration::seconds(-60)))
        .unwrap();
    let (status, body) =
        get_with_token("/api/check_token", Some(&issued.token), TokenVerifier::new(&config), None, MockBackend::new())
            .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("expired_token"), "was: {body}");
}

#[actix_web::test]
async fn valid_tokens_reach_the_handler() {
    let config = AuthConfig::random();
    let issued = issue(&config, 42, false);
    let (status, body) =
        get_with_token("/api/check_token", Some(&issued.token), TokenVerifier::new(&config), None, MockBackend::new())
            .await;
    assert!(status.is_success(), "was: {status} {body}");
    let claims: JwtClaims = serde_json::from_str(&body).unwrap();
    assert_eq!(claims, issued.claims);
}

#[actix_web::test]
async fn non_admins_get_forbidden_not_unauthorized() {
    let config = AuthConfig::random();
    let issued = issue(&config, 1, false);
    let (status, body) =
        get_with_token("/api/users", Some(&issued.token), TokenVerifier::new(&config), None, MockBackend::new()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Insufficient Permissions"), "was: {body}");
}

#[actix_web::test]
async fn admins_reach_admin_routes() {
    let config = AuthConfig::random();
    let issued = issue(&config, 1, true);
    let mut accounts = MockBackend::new();
    accounts.expect_fetch_users().returning(|| Ok(vec![test_user(1, "password123", true)]));
    let (status, body) =
        get_with_token("/api/users", Some(&issued.token), TokenVerifier::new(&config), None, accounts).await;
    assert!(status.is_success(), "was: {status} {body}");
    let users: Vec<UserProfile> = serde_json::from_str(&body).unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].username, "user1");
}

#[actix_web::test]
async fn a_live_session_lets_the_request_through() {
    let config = AuthConfig::random();
    let issued = issue(&config, 1, false);
    let record = live_session(&issued);
    let mut sessions = MockBackend::new();
    sessions.expect_fetch_session().returning(move |_| Ok(Some(record.clone())));
    let (status, _) = get_with_token(
        "/api/check_token",
        Some(&issued.token),
        TokenVerifier::new(&config),
        Some(sessions),
        MockBackend::new(),
    )
    .await;
    assert!(status.is_success());
}

#[actix_web::test]
async fn revoked_sessions_are_rejected() {
    let config = AuthConfig::random();
    let issued = issue(&config, 1, false);
    let mut record = live_session(&issued);
    record.revoked = true;
    let mut sessions = MockBackend::new();
    sessions.expect_fetch_session().returning(move |_| Ok(Some(record.clone())));
    let (status, body) = get_with_token(
        "/api/check_token",
        Some(&issued.token),
        TokenVerifier::new(&config),
        Some(sessions),
        MockBackend::new(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("session_revoked"), "was: {body}");
}

#[actix_web::test]
async fn a_missing_session_record_is_as_good_as_revoked() {
    let config = AuthConfig::random();
    let issued = issue(&config, 1, false);
    let mut sessions = MockBackend::new();
    sessions.expect_fetch_session().returning(|_| Ok(None));
    let (status, body) = get_with_token(
        "/api/check_token",
        Some(&issued.token),
        TokenVerifier::new(&config),
        Some(sessions),
        MockBackend::new(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("session_revoked"), "was: {body}");
}

#[actix_web::test]
async fn an_expired_session_record_is_rejected_even_if_present() {
    let config = AuthConfig::random();
    let issued = issue(&config, 1, false);
    let mut record = live_session(&issued);
    record.expires_at = Utc::now() - Duration::seconds(10);
    let mut sessions = MockBackend::new();
    sessions.expect_fetch_session().returning(move |_| Ok(Some(record.clone())));
    let (status, _) = get_with_token(
        "/api/check_token",
        Some(&issued.token),
        TokenVerifier::new(&config),
        Some(sessions),
        MockBackend::new(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn an_unreachable_session_store_fails_closed() {
    let config = AuthConfig::random();
    let issued = issue(&config, 1, false);
    let mut sessions = MockBackend::new();
    sessions
        .expect_fetch_session()
        .returning(|_| Err(SessionApiError::DatabaseError("connection refused".to_string())));
    let (status, body) = get_with_token(
        "/api/check_token",
        Some(&issued.token),
        TokenVerifier::new(&config),
        Some(sessions),
        MockBackend::new(),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "store failure must never grant access. was: {body}");
}

#[actix_web::test]
async fn the_admin_gate_fails_closed_without_a_principal() {
    // The ACL middleware registered without the auth middleware in front of it: no claims are
    // ever bound, and the gate must deny rather than let the request through.
    let _ = env_logger::try_init().ok();
    let app = App::new()
        .app_data(web::Data::new(AccountApi::new(MockBackend::new())))
        .service(ListUsersRoute::<MockBackend>::new());
    let app = test::init_service(app).await;
    let req = TestRequest::get().uri("/users").to_request();
    let (status, body) = call_and_read(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "was: {body}");
}
