use abo_common::Secret;
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use atrium_accounts::db_types::{Role, Roles, TokenId, UserRecord};
use chrono::{DateTime, Duration, Utc};
use futures::future::{ready, Ready};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
    TimeOptions,
    Token,
    UntrustedToken,
    ValidationError,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The custom claims signed into every access token. This is the principal for a request: the
/// auth middleware verifies the token and binds the claims into the request extensions, and
/// nothing downstream re-derives identity or roles from request data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: i64,
    pub username: String,
    pub email: String,
    pub roles: Roles,
    pub jti: TokenId,
}

impl JwtClaims {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

impl From<&UserRecord> for JwtClaims {
    fn from(user: &UserRecord) -> Self {
        Self {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            roles: user.roles(),
            jti: TokenId::random(),
        }
    }
}

/// Handlers take `JwtClaims` as an extractor. The claims are only ever placed in the extensions
/// by the auth middleware, so a missing entry means the route was not wired behind it.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

/// An encoded access token together with the claims that were signed into it.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: JwtClaims,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenIssuer {
    signing_key: Secret<Hs256Key>,
    token_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { signing_key: config.signing_key.clone(), token_lifetime: config.token_lifetime }
    }

    /// Issue a new access token for the given user, with a fresh token id.
    ///
    /// This method DOES NOT check the user's credentials. This must be done prior to calling
    /// `issue`.
    pub fn issue(&self, user: &UserRecord, duration: Option<Duration>) -> Result<IssuedToken, AuthError> {
        let duration = duration.unwrap_or(self.token_lifetime);
        let custom = JwtClaims::from(user);
        let claims = Claims::new(custom).set_duration_and_issuance(&TimeOptions::default(), duration);
        let header = Header::empty().with_token_type("JWT");
        let token = Hs256
            .token(&header, &claims, self.signing_key.reveal())
            .map_err(|e| AuthError::ValidationError(format!("{e:?}")))?;
        let issued_at = claims.issued_at.unwrap_or_else(Utc::now);
        let expires_at = claims.expiration.unwrap_or(issued_at + duration);
        Ok(IssuedToken { token, claims: claims.custom, issued_at, expires_at })
    }
}

/// Verifies access tokens. A pure function of the token and the configured keys: no I/O, so the
/// cryptographic check never depends on store availability.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Vec<Secret<Hs256Key>>,
}

impl TokenVerifier {
    /// The verifier accepts tokens signed with the current key or any of the configured
    /// previously-valid keys, checked in that order.
    pub fn new(config: &AuthConfig) -> Self {
        let mut keys = Vec::with_capacity(config.previous_keys.len() + 1);
        keys.push(config.signing_key.clone());
        keys.extend(config.previous_keys.iter().cloned());
        Self { keys }
    }

    /// Decodes and authenticates a token, then checks expiry (with zero leeway, so a token is
    /// dead the instant its `exp` passes). Expiry is reported distinctly from authentication
    /// failure so that clients can prompt a re-login instead of treating it as tampering.
    pub fn verify<S: AsRef<str>>(&self, token: S) -> Result<JwtClaims, AuthError> {
        let untrusted_token =
            UntrustedToken::new(token.as_ref()).map_err(|e| AuthError::PoorlyFormattedToken(format!("{e:?}")))?;
        let mut validated: Result<Token<JwtClaims>, AuthError> =
            Err(AuthError::ValidationError("no verification keys are configured".to_string()));
        for key in &self.keys {
            match Hs256.validator(key.reveal()).validate(&untrusted_token) {
                Ok(token) => {
                    validated = Ok(token);
                    break;
                },
                Err(e) => validated = Err(map_validation_error(e)),
            }
        }
        let (_header, claims) = validated?.into_parts();
        if let Err(e) = claims.validate_expiration(&TimeOptions::from_leeway(Duration::zero())) {
            return Err(map_validation_error(e));
        }
        Ok(claims.custom)
    }
}

fn map_validation_error(e: ValidationError) -> AuthError {
    match &e {
        ValidationError::Expired => AuthError::TokenExpired,
        ValidationError::InvalidSignature => AuthError::ValidationError(format!("{e:?}")),
        _ => AuthError::PoorlyFormattedToken(format!("{e:?}")),
    }
}
