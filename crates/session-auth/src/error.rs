//! Authentication error types

use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Text shown to end users for every rejected login, whatever the cause.
pub const GENERIC_LOGIN_FAILURE: &str = "Invalid username or password";

/// Authentication errors
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthError {
    /// Unknown user, wrong secret or disabled account
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The user directory could not be reached or failed mid-lookup
    #[error("User directory unavailable: {message}")]
    DirectoryUnavailable { message: String },

    /// No live session for the presented identifier
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Session id generation kept colliding with live sessions
    #[error("Session id generation collided {attempts} times in a row")]
    CollisionRetryExhausted { attempts: u32 },

    /// Presented session id is not well-formed
    #[error("Malformed session identifier")]
    InvalidSessionId,

    /// Configuration errors
    #[error("Authentication configuration error: {message}")]
    ConfigurationError { message: String },

    /// Cryptographic errors
    #[error("Cryptographic error: {message}")]
    CryptographicError { message: String },

    /// Caller supplied input the core refuses to process
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl AuthError {
    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::DirectoryUnavailable { .. } => "DIRECTORY_UNAVAILABLE",
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::CollisionRetryExhausted { .. } => "SESSION_ID_EXHAUSTED",
            AuthError::InvalidSessionId => "UNAUTHENTICATED",
            AuthError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
            AuthError::CryptographicError { .. } => "CRYPTOGRAPHIC_ERROR",
            AuthError::InvalidInput { .. } => "INVALID_INPUT",
        }
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::InvalidCredentials => 401,
            // Login failures look the same from outside
            AuthError::DirectoryUnavailable { .. } => 401,
            AuthError::Unauthenticated => 401,
            AuthError::InvalidSessionId => 401,
            AuthError::InvalidInput { .. } => 400,
            AuthError::CollisionRetryExhausted { .. } => 500,
            AuthError::ConfigurationError { .. } => 500,
            AuthError::CryptographicError { .. } => 500,
        }
    }

    /// Message safe to show to the end user.
    ///
    /// `InvalidCredentials` and `DirectoryUnavailable` share one text so a
    /// caller cannot tell an unknown user from an outage.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials | AuthError::DirectoryUnavailable { .. } => {
                GENERIC_LOGIN_FAILURE
            }
            AuthError::Unauthenticated | AuthError::InvalidSessionId => "Authentication required",
            AuthError::InvalidInput { .. } => "Invalid request",
            AuthError::CollisionRetryExhausted { .. }
            | AuthError::ConfigurationError { .. }
            | AuthError::CryptographicError { .. } => "Internal server error",
        }
    }

    /// Whether the failure is operational rather than caused by the caller
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            AuthError::DirectoryUnavailable { .. }
                | AuthError::CollisionRetryExhausted { .. }
                | AuthError::ConfigurationError { .. }
                | AuthError::CryptographicError { .. }
        )
    }

    /// Create a directory error
    pub fn directory_unavailable(message: impl Into<String>) -> Self {
        Self::DirectoryUnavailable { message: message.into() }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigurationError { message: message.into() }
    }

    /// Create a cryptographic error
    pub fn crypto_error(message: impl Into<String>) -> Self {
        Self::CryptographicError { message: message.into() }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput { message: message.into() }
    }
}

/// Failure reported by a [`UserDirectory`](crate::UserDirectory).
///
/// Distinct from "not found", which directories report as `Ok(None)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("directory error: {message}")]
pub struct DirectoryError {
    pub message: String,
}

impl DirectoryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl From<DirectoryError> for AuthError {
    fn from(err: DirectoryError) -> Self {
        Self::DirectoryUnavailable { message: err.message }
    }
}

#[cfg(feature = "argon2")]
impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::crypto_error(err.to_string())
    }
}

#[cfg(feature = "bcrypt")]
impl From<bcrypt::BcryptError> for AuthError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::crypto_error(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::crypto_error(format!("hashing task failed: {}", err))
    }
}
