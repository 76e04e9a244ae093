use std::env;

use abo_common::{parse_boolean_flag, Secret};
use chrono::Duration;
use jwt_compact::alg::Hs256Key;
use log::*;
use rand::{thread_rng, RngCore};

use crate::errors::ServerError;

const DEFAULT_ABO_HOST: &str = "127.0.0.1";
const DEFAULT_ABO_PORT: u16 = 8380;
const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 24;

/// Length, in bytes, of the HMAC key used to sign access tokens.
pub const SIGNING_KEY_LENGTH: usize = 32;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// When true (the default), every issued token is backed by a session record and verification
    /// consults the store, so that tokens can be revoked before their natural expiry. When false,
    /// verification is purely cryptographic and no session records are kept.
    pub session_tracking: bool,
    /// If set, an admin user with these credentials is created at startup, unless it already
    /// exists.
    pub initial_admin: Option<InitialAdmin>,
}

#[derive(Clone, Debug)]
pub struct InitialAdmin {
    pub username: String,
    pub email: String,
    pub password: Secret<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ABO_HOST.to_string(),
            port: DEFAULT_ABO_PORT,
            database_url: String::default(),
            auth: AuthConfig::random(),
            session_tracking: true,
            initial_admin: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    /// Builds the configuration from `ABO_*` environment variables.
    ///
    /// Most values fall back to defaults with a logged complaint, but an absent or invalid
    /// signing key is a hard error: starting up with a made-up key would silently invalidate
    /// every live session and must be an explicit (test-only) choice.
    pub fn from_env() -> Result<Self, ServerError> {
        let host = env::var("ABO_HOST").ok().unwrap_or_else(|| DEFAULT_ABO_HOST.into());
        let port = env::var("ABO_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for ABO_PORT. {e} Using the default, {DEFAULT_ABO_PORT}, instead."
                    );
                    DEFAULT_ABO_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_ABO_PORT);
        let database_url = env::var("ABO_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ ABO_DATABASE_URL is not set. Please set it to the URL for the accounts database.");
            String::default()
        });
        let auth = AuthConfig::try_from_env()?;
        let session_tracking = parse_boolean_flag(env::var("ABO_SESSION_TRACKING").ok(), true);
        if !session_tracking {
            warn!(
                "🪛️ Session tracking is disabled. Access tokens cannot be revoked before they expire. If this is not \
                 what you want, unset ABO_SESSION_TRACKING."
            );
        }
        let initial_admin = InitialAdmin::from_env();
        Ok(Self { host, port, database_url, auth, session_tracking, initial_admin })
    }
}

impl InitialAdmin {
    /// Reads the optional initial admin credentials. All three variables must be present for the
    /// seeding step to run.
    pub fn from_env() -> Option<Self> {
        let username = env::var("ABO_INITIAL_ADMIN_USERNAME").ok()?;
        let email = env::var("ABO_INITIAL_ADMIN_EMAIL").ok()?;
        let password = env::var("ABO_INITIAL_ADMIN_PASSWORD").ok()?;
        Some(Self { username, email, password: Secret::new(password) })
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The key used to sign new access tokens. Base64-encoded in `ABO_JWT_SIGNING_KEY` and
    /// exactly [`SIGNING_KEY_LENGTH`] bytes long.
    pub signing_key: Secret<Hs256Key>,
    /// Previously-valid signing keys, newest first. Verification accepts tokens signed with any
    /// of these, which lets operators rotate the signing key without breaking live sessions.
    pub previous_keys: Vec<Secret<Hs256Key>>,
    /// How long issued tokens live. `ABO_TOKEN_LIFETIME`, in hours.
    pub token_lifetime: Duration,
}

impl AuthConfig {
    /// An ephemeral random key. Used in tests; never in a deployed server, where losing the key
    /// on restart would invalidate every session.
    pub fn random() -> Self {
        let mut key = [0u8; SIGNING_KEY_LENGTH];
        thread_rng().fill_bytes(&mut key);
        Self {
            signing_key: Secret::new(Hs256Key::new(key.as_slice())),
            previous_keys: Vec::new(),
            token_lifetime: Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS),
        }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let key_b64 = env::var("ABO_JWT_SIGNING_KEY")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [ABO_JWT_SIGNING_KEY]")))?;
        let signing_key = decode_key(&key_b64).map_err(|e| {
            ServerError::ConfigurationError(format!("Invalid signing key in ABO_JWT_SIGNING_KEY: {e}"))
        })?;
        let previous_keys = match env::var("ABO_JWT_PREVIOUS_KEYS") {
            Ok(s) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(decode_key)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| {
                    ServerError::ConfigurationError(format!("Invalid key in ABO_JWT_PREVIOUS_KEYS: {e}"))
                })?,
            Err(_) => Vec::new(),
        };
        let token_lifetime = env::var("ABO_TOKEN_LIFETIME")
            .map_err(|_| {
                info!(
                    "🪛️ ABO_TOKEN_LIFETIME is not set. Using the default value of {DEFAULT_TOKEN_LIFETIME_HOURS} hrs."
                )
            })
            .and_then(|s| {
                s.parse::<i64>()
                    .map(Duration::hours)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for ABO_TOKEN_LIFETIME. {e}"))
            })
            .ok()
            .unwrap_or_else(|| Duration::hours(DEFAULT_TOKEN_LIFETIME_HOURS));
        Ok(Self { signing_key, previous_keys, token_lifetime })
    }
}

fn decode_key(key_b64: &str) -> Result<Secret<Hs256Key>, String> {
    let bytes = base64::decode(key_b64).map_err(|e| format!("not valid base64: {e}"))?;
    if bytes.len() != SIGNING_KEY_LENGTH {
        return Err(format!("the key must be exactly {SIGNING_KEY_LENGTH} bytes, but was {}", bytes.len()));
    }
    Ok(Secret::new(Hs256Key::new(bytes.as_slice())))
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that route handlers need. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the
/// system.
#[derive(Clone, Copy, Debug)]
pub struct ServerOptions {
    pub session_tracking: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { session_tracking: config.session_tracking }
    }
}
