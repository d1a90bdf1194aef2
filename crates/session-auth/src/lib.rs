//! # session-auth: session-based authentication core
//!
//! Credential verification against an external user directory, revocable
//! server-side sessions keyed by opaque random identifiers, and identity
//! re-resolution on every request.
//!
//! ```no_run
//! use std::sync::Arc;
//! use session_auth::{AuthConfig, AuthenticationGate, Identity, MemoryUserDirectory};
//!
//! # async fn run() -> session_auth::AuthResult<()> {
//! let mut config = AuthConfig::development();
//! config.password.hash_algorithm = "plaintext".to_string();
//!
//! let directory = Arc::new(MemoryUserDirectory::new());
//! directory.insert(Identity::new("u1", "jon", "s3cret"));
//!
//! let gate = AuthenticationGate::new(directory, &config)?;
//! let session_id = gate.login("jon", "s3cret").await?;
//! let set_cookie = gate.cookie().set_cookie(&session_id);
//!
//! assert!(gate.authenticate(&session_id).await.is_some());
//! gate.logout(&session_id);
//! # let _ = set_cookie;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod cookie;
pub mod directory;
pub mod error;
pub mod gate;
pub mod identity;
pub mod logging;
pub mod password;
pub mod resolver;
pub mod session;
pub mod traits;
pub mod verifier;

// Error handling
pub use error::{AuthError, DirectoryError, GENERIC_LOGIN_FAILURE};

// Collaborator seams
pub use traits::{Clock, PasswordHasher, SessionIdGenerator, UserDirectory};

// Configuration
pub use config::{AuthConfig, CookieSameSite, CookieSecret, PasswordConfig, SessionConfig};

// Data model
pub use identity::{Identity, IdentityId, UserContext};
pub use session::{Session, SessionId, SessionRegistry, SessionSweeper};

// Components
pub use cookie::SessionCookie;
pub use logging::{init_logging, LoggingConfig};
pub use directory::MemoryUserDirectory;
pub use gate::AuthenticationGate;
pub use resolver::IdentityResolver;
pub use verifier::{CredentialVerifier, VerificationResult};

/// Authentication result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
