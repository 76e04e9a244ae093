use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use atrium_accounts::{
    db_types::NewUser,
    AccountApi,
    AuthApi,
    SessionApi,
    SqliteDatabase,
    UserManagement,
};
use log::info;

use crate::{
    auth::{TokenIssuer, TokenVerifier},
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    middleware::AuthMiddlewareFactory,
    routes::{
        health,
        CheckTokenRoute,
        ListUsersRoute,
        LoginRoute,
        LogoutRoute,
        MyProfileRoute,
        RevokeUserSessionsRoute,
        UpdatePasswordRoute,
        UserByIdRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    create_initial_admin(&config, &db).await?;
    if config.session_tracking {
        // Runs for the lifetime of the process; do not await the handle.
        let _expiry_worker = start_expiry_worker(db.clone());
    }
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let auth_api = AuthApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let sessions_api = SessionApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let verifier = TokenVerifier::new(&config.auth);
        let options = ServerOptions::from_config(&config);
        let session_guard = config.session_tracking.then(|| SessionApi::new(db.clone()));
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("abo::access_log"))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(sessions_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(options));
        // Routes that require authentication. The auth middleware wraps the whole scope, so no
        // route inside it can be reached without a verified token; the per-route ACL middleware
        // then enforces roles inside it.
        let auth_scope = web::scope("/api")
            .wrap(AuthMiddlewareFactory::new(verifier, session_guard))
            .service(LogoutRoute::<SqliteDatabase>::new())
            .service(MyProfileRoute::<SqliteDatabase>::new())
            .service(UpdatePasswordRoute::<SqliteDatabase>::new())
            .service(ListUsersRoute::<SqliteDatabase>::new())
            .service(UserByIdRoute::<SqliteDatabase>::new())
            .service(RevokeUserSessionsRoute::<SqliteDatabase>::new())
            .service(CheckTokenRoute::new());
        app.service(health).service(LoginRoute::<SqliteDatabase>::new()).service(auth_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}

/// Seeds the admin account configured in `ABO_INITIAL_ADMIN_*`, unless a user with that
/// username already exists.
async fn create_initial_admin(config: &ServerConfig, db: &SqliteDatabase) -> Result<(), ServerError> {
    let Some(admin) = &config.initial_admin else {
        return Ok(());
    };
    let existing = db
        .fetch_user_by_identifier(&admin.username)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if existing.is_some() {
        info!("🗃️ Initial admin user {} already exists", admin.username);
        return Ok(());
    }
    let user = NewUser {
        username: admin.username.clone(),
        email: admin.email.clone(),
        full_name: "System Admin".to_string(),
        password: admin.password.clone(),
        is_admin: true,
    };
    AuthApi::new(db.clone())
        .create_user(user)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not create the initial admin user. {e}")))?;
    info!("🗃️ Created initial admin user {}", admin.username);
    Ok(())
}
