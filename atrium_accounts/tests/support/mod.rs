use abo_common::Secret;
use atrium_accounts::{db_types::NewUser, AuthApi, SqliteDatabase};
use log::info;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn random_db_path() -> String {
    format!("sqlite://{}/atrium_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

pub async fn prepare_test_db(url: &str) -> SqliteDatabase {
    let _ = env_logger::try_init();
    let _ = Sqlite::drop_database(url).await;
    Sqlite::create_database(url).await.expect("Error creating test database");
    info!("Created Sqlite database {url}");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db
}

pub async fn seed_user(db: &SqliteDatabase, username: &str, password: &str, is_admin: bool) -> i64 {
    let api = AuthApi::new(db.clone());
    let user = NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: String::default(),
        password: Secret::new(password.to_string()),
        is_admin,
    };
    api.create_user(user).await.expect("Error seeding user").id
}
