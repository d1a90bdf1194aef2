//! Seams between the authentication core and its collaborators

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::{AuthResult, DirectoryError, Identity, IdentityId};

/// External user directory.
///
/// Lookups may be slow or fail; "not found" is `Ok(None)`, transport or
/// storage failures are `Err`.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find an identity by login name
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, DirectoryError>;

    /// Find an identity by its stable identifier
    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, DirectoryError>;
}

/// Password hasher trait for different hashing algorithms
pub trait PasswordHasher: Send + Sync {
    /// Hash a password
    fn hash_password(&self, password: &str) -> AuthResult<String>;

    /// Verify a password against its stored form
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool>;

    /// Get the hasher name
    fn hasher_name(&self) -> &str;

    /// Stored-form credential checked when no account matches a login, so a
    /// failed lookup costs as much as a wrong secret
    fn dummy_hash(&self) -> AuthResult<String> {
        self.hash_password(DUMMY_SECRET)
    }
}

/// Secret hashed into [`PasswordHasher::dummy_hash`]
pub const DUMMY_SECRET: &str = "session-auth-dummy-credential";

/// Source of raw session identifiers
pub trait SessionIdGenerator: Send + Sync {
    /// Produce a candidate identifier of `length` characters
    fn generate(&self, length: usize) -> String;
}

/// Wall clock used for session timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
