//! Authentication configuration types and utilities

use crate::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Prefix for environment overrides read by [`AuthConfig::from_env`]
pub const ENV_PREFIX: &str = "SESSION_AUTH_";

/// Fewest id characters giving 128 bits of entropy over a 62-symbol alphabet
pub const MIN_SESSION_ID_LENGTH: usize = 22;

/// Longest session id accepted from clients
pub const MAX_SESSION_ID_LENGTH: usize = 256;

/// Shortest accepted cookie signing key, in bytes
pub const MIN_COOKIE_SECRET_LENGTH: usize = 32;

/// Main authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Password hashing configuration
    #[serde(default)]
    pub password: PasswordConfig,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in seconds
    #[serde(default = "default_session_ttl")]
    pub ttl: u64,

    /// Push expiry forward on every successful lookup
    #[serde(default = "default_false")]
    pub sliding_expiration: bool,

    /// Background sweep interval in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,

    /// Session id length in characters
    #[serde(default = "default_id_length")]
    pub id_length: usize,

    /// Id generation attempts before giving up on collisions
    #[serde(default = "default_max_id_attempts")]
    pub max_id_attempts: u32,

    /// Session cookie name
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Session cookie domain
    pub cookie_domain: Option<String>,

    /// Session cookie path
    #[serde(default = "default_cookie_path")]
    pub cookie_path: String,

    /// Session cookie secure flag
    #[serde(default = "default_false")]
    pub cookie_secure: bool,

    /// Session cookie HTTP-only flag
    #[serde(default = "default_true")]
    pub cookie_http_only: bool,

    /// Session cookie SameSite policy
    #[serde(default)]
    pub cookie_same_site: CookieSameSite,

    /// Key used to sign the session cookie. Unsigned cookies when absent.
    #[serde(default)]
    pub cookie_secret: Option<CookieSecret>,
}

/// Cookie signing key, supplied by configuration and never logged
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CookieSecret(String);

impl CookieSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Raw key bytes
    pub fn expose(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for CookieSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CookieSecret(<redacted>)")
    }
}

/// Cookie SameSite attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CookieSameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl fmt::Display for CookieSameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieSameSite::Strict => write!(f, "Strict"),
            CookieSameSite::Lax => write!(f, "Lax"),
            CookieSameSite::None => write!(f, "None"),
        }
    }
}

impl FromStr for CookieSameSite {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" | "true" => Ok(CookieSameSite::Strict),
            "lax" => Ok(CookieSameSite::Lax),
            "none" => Ok(CookieSameSite::None),
            _ => Err(AuthError::config_error(format!(
                "Invalid SameSite policy '{}', expected Strict, Lax or None",
                s
            ))),
        }
    }
}

/// Password hashing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Password hashing algorithm (argon2, bcrypt, plaintext)
    #[serde(default = "default_hash_algorithm")]
    pub hash_algorithm: String,

    /// Bcrypt cost factor (if using bcrypt)
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Argon2 memory cost in KB (if using argon2)
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory: u32,

    /// Argon2 time cost (iterations)
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism factor
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// Default value functions
fn default_session_ttl() -> u64 {
    24 * 60 * 60
} // 24 hours
fn default_sweep_interval() -> u64 {
    60 * 60
} // 1 hour
fn default_id_length() -> usize {
    32
}
fn default_max_id_attempts() -> u32 {
    5
}
fn default_cookie_name() -> String {
    "sid".to_string()
}
fn default_cookie_path() -> String {
    "/".to_string()
}
fn default_hash_algorithm() -> String {
    "argon2".to_string()
}
fn default_bcrypt_cost() -> u32 {
    12
}
fn default_argon2_memory() -> u32 {
    65536
} // 64MB
fn default_argon2_iterations() -> u32 {
    3
}
fn default_argon2_parallelism() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: default_session_ttl(),
            sliding_expiration: default_false(),
            sweep_interval: default_sweep_interval(),
            id_length: default_id_length(),
            max_id_attempts: default_max_id_attempts(),
            cookie_name: default_cookie_name(),
            cookie_domain: None,
            cookie_path: default_cookie_path(),
            cookie_secure: default_false(),
            cookie_http_only: default_true(),
            cookie_same_site: CookieSameSite::default(),
            cookie_secret: None,
        }
    }
}

impl SessionConfig {
    /// Session lifetime as a `Duration`
    pub fn ttl_duration(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }

    /// Sweep interval as a `Duration`
    pub fn sweep_interval_duration(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    /// Validate the session settings
    pub fn validate(&self) -> AuthResult<()> {
        if self.ttl == 0 {
            return Err(AuthError::config_error("Session ttl must be greater than zero"));
        }

        if self.sweep_interval == 0 {
            return Err(AuthError::config_error("Sweep interval must be greater than zero"));
        }

        if self.id_length < MIN_SESSION_ID_LENGTH || self.id_length > MAX_SESSION_ID_LENGTH {
            return Err(AuthError::config_error(format!(
                "Session id length must be between {} and {} characters",
                MIN_SESSION_ID_LENGTH, MAX_SESSION_ID_LENGTH
            )));
        }

        if self.max_id_attempts == 0 {
            return Err(AuthError::config_error("max_id_attempts must be at least 1"));
        }

        if self.cookie_name.is_empty()
            || self
                .cookie_name
                .chars()
                .any(|c| c.is_whitespace() || "=;,".contains(c))
        {
            return Err(AuthError::config_error("Invalid session cookie name"));
        }

        if self.cookie_same_site == CookieSameSite::None && !self.cookie_secure {
            return Err(AuthError::config_error("SameSite=None requires a secure cookie"));
        }

        if let Some(secret) = &self.cookie_secret {
            if secret.expose().len() < MIN_COOKIE_SECRET_LENGTH {
                return Err(AuthError::config_error(format!(
                    "Cookie secret must be at least {} bytes",
                    MIN_COOKIE_SECRET_LENGTH
                )));
            }
        }

        Ok(())
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            hash_algorithm: default_hash_algorithm(),
            bcrypt_cost: default_bcrypt_cost(),
            argon2_memory: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl AuthConfig {
    /// Development configuration: plain HTTP cookies and cheap hashing
    pub fn development() -> Self {
        let mut config = Self::default();
        config.session.cookie_secure = false;
        config.session.cookie_same_site = CookieSameSite::Lax;
        config.password.argon2_memory = 4096;
        config.password.argon2_iterations = 2;
        config.password.argon2_parallelism = 2;
        config.password.bcrypt_cost = 4;
        config
    }

    /// Production configuration with strict cookie policy
    pub fn production() -> Self {
        let mut config = Self::default();
        config.session.cookie_secure = true;
        config.session.cookie_same_site = CookieSameSite::Strict;
        config.session.ttl = 8 * 60 * 60;
        config.password.argon2_iterations = 4;
        config
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> AuthResult<Self> {
        serde_yaml::from_str(yaml).map_err(|e| AuthError::config_error(e.to_string()))
    }

    /// Load configuration from `SESSION_AUTH_*` environment variables over defaults
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Keys are the `SESSION_AUTH_`-prefixed variable names.
    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("SESSION_TTL") {
            config.session.ttl = parse_field("SESSION_TTL", &value)?;
        }
        if let Some(value) = var("SLIDING_EXPIRATION") {
            config.session.sliding_expiration = parse_field("SLIDING_EXPIRATION", &value)?;
        }
        if let Some(value) = var("SWEEP_INTERVAL") {
            config.session.sweep_interval = parse_field("SWEEP_INTERVAL", &value)?;
        }
        if let Some(value) = var("ID_LENGTH") {
            config.session.id_length = parse_field("ID_LENGTH", &value)?;
        }
        if let Some(value) = var("MAX_ID_ATTEMPTS") {
            config.session.max_id_attempts = parse_field("MAX_ID_ATTEMPTS", &value)?;
        }
        if let Some(value) = var("COOKIE_NAME") {
            config.session.cookie_name = value;
        }
        config.session.cookie_domain = var("COOKIE_DOMAIN");
        if let Some(value) = var("COOKIE_PATH") {
            config.session.cookie_path = value;
        }
        if let Some(value) = var("COOKIE_SECURE") {
            config.session.cookie_secure = parse_field("COOKIE_SECURE", &value)?;
        }
        if let Some(value) = var("COOKIE_HTTP_ONLY") {
            config.session.cookie_http_only = parse_field("COOKIE_HTTP_ONLY", &value)?;
        }
        if let Some(value) = var("COOKIE_SAME_SITE") {
            config.session.cookie_same_site = value.parse()?;
        }
        config.session.cookie_secret = var("COOKIE_SECRET").map(CookieSecret::new);
        if let Some(value) = var("HASH_ALGORITHM") {
            config.password.hash_algorithm = value.to_lowercase();
        }
        if let Some(value) = var("BCRYPT_COST") {
            config.password.bcrypt_cost = parse_field("BCRYPT_COST", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> AuthResult<()> {
        self.session.validate()?;

        if !["argon2", "bcrypt", "plaintext"].contains(&self.password.hash_algorithm.as_str()) {
            return Err(AuthError::config_error(format!(
                "Unknown password hashing algorithm: {}",
                self.password.hash_algorithm
            )));
        }

        Ok(())
    }

    /// Stricter checks applied before serving real traffic
    pub fn validate_production(&self) -> AuthResult<()> {
        self.validate()?;

        if self.password.hash_algorithm == "plaintext" {
            return Err(AuthError::config_error("Plaintext credentials are not allowed in production"));
        }

        if !self.session.cookie_secure {
            return Err(AuthError::config_error("Session cookie must be secure in production"));
        }

        Ok(())
    }
}

fn parse_field<T: FromStr>(field: &str, value: &str) -> AuthResult<T> {
    value.trim().parse().map_err(|_| {
        AuthError::config_error(format!("Invalid value '{}' for {}{}", value, ENV_PREFIX, field))
    })
}
