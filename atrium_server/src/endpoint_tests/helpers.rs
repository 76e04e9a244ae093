use actix_web::{
    body::MessageBody,
    dev::{Service, ServiceResponse},
    http::StatusCode,
    test,
    Error,
    HttpResponse,
};
use atrium_accounts::{db_types::UserRecord, helpers::hash_password};
use chrono::Utc;

pub fn test_user(id: i64, password: &str, is_admin: bool) -> UserRecord {
    UserRecord {
        id,
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        full_name: "Test User".to_string(),
        hashed_password: hash_password(password).unwrap(),
        is_admin,
        password_changed_at: Utc::now(),
        created_at: Utc::now(),
    }
}

pub fn response_to_string(res: HttpResponse) -> String {
    let body = res.into_body().try_into_bytes().unwrap();
    String::from_utf8_lossy(&body).into_owned()
}

/// Calls the service and folds both outcomes into a `(status, body)` pair. Handler errors are
/// already converted into responses by actix, but middleware rejections surface as service-level
/// errors in tests, so both paths are handled here.
pub async fn call_and_read<S, B, R>(app: &S, req: R) -> (StatusCode, String)
where
    S: Service<R, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    match test::try_call_service(app, req).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let res = HttpResponse::from_error(e);
            let status = res.status();
            (status, response_to_string(res))
        },
    }
}
