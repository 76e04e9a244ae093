use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use atrium_accounts::{SessionApiError, UserApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The session store is unavailable. {0}")]
    StoreUnavailable(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            // All token failures collapse to 401. The `reason` field in the body tells
            // well-behaved clients whether a silent re-login is worth attempting.
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            // A revocation check that cannot complete must deny, not allow.
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InitializeError(_)
            | Self::BackendError(_)
            | Self::IOError(_)
            | Self::ConfigurationError(_)
            | Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = serde_json::json!({ "error": self.to_string() });
        if let Self::AuthenticationError(e) = self {
            body["reason"] = serde_json::json!(e.reason());
        }
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

/// Authentication failures. The `Display` strings are what clients see; cryptographic detail
/// stays in the variant payloads, which are only ever logged.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Auth token not provided")]
    MissingToken,
    #[error("Access token is not in the correct format")]
    PoorlyFormattedToken(String),
    #[error("Access token signature is invalid")]
    ValidationError(String),
    #[error("Access token has expired")]
    TokenExpired,
    #[error("Session has been revoked or is no longer active")]
    SessionRevoked,
    #[error("Invalid username/email or password")]
    InvalidCredentials,
}

impl AuthError {
    /// Machine-readable failure kind for the response body.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingToken => "missing_token",
            Self::PoorlyFormattedToken(_) => "malformed_token",
            Self::ValidationError(_) => "invalid_token",
            Self::TokenExpired => "expired_token",
            Self::SessionRevoked => "session_revoked",
            Self::InvalidCredentials => "invalid_credentials",
        }
    }
}

impl From<UserApiError> for ServerError {
    fn from(e: UserApiError) -> Self {
        match e {
            UserApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            UserApiError::UserNotFound => Self::NoRecordFound("User not found".to_string()),
            UserApiError::DuplicateUser(detail) => {
                Self::InvalidRequestBody(format!("A user with those details already exists. {detail}"))
            },
            UserApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            UserApiError::HashingError(e) => Self::BackendError(format!("Password hash error: {e}")),
        }
    }
}

impl From<SessionApiError> for ServerError {
    fn from(e: SessionApiError) -> Self {
        match e {
            SessionApiError::SessionNotFound => Self::NoRecordFound("Session not found".to_string()),
            SessionApiError::DatabaseError(e) => Self::StoreUnavailable(e),
        }
    }
}
