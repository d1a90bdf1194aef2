//! Credential verification against the user directory

use crate::{AuthError, AuthResult, DirectoryError, Identity, PasswordHasher, UserDirectory};
use std::sync::Arc;

/// Outcome of checking a username/secret pair.
///
/// "Unknown user" and "wrong secret" are deliberately the same variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Success(Identity),
    InvalidCredentials,
    DirectoryError(DirectoryError),
}

impl VerificationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, VerificationResult::Success(_))
    }

    /// Convert into the crate error model
    pub fn into_result(self) -> AuthResult<Identity> {
        match self {
            VerificationResult::Success(identity) => Ok(identity),
            VerificationResult::InvalidCredentials => Err(AuthError::InvalidCredentials),
            VerificationResult::DirectoryError(err) => Err(err.into()),
        }
    }
}

/// Checks credentials against a [`UserDirectory`]. Read-only, never retries.
pub struct CredentialVerifier<D: ?Sized> {
    directory: Arc<D>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<D> CredentialVerifier<D>
where
    D: UserDirectory + ?Sized,
{
    pub fn new(directory: Arc<D>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { directory, hasher }
    }

    /// Verify `secret` for `username`.
    ///
    /// Empty secrets are passed through; whether they can ever match is up to
    /// the stored credential.
    pub async fn verify(&self, username: &str, secret: &str) -> VerificationResult {
        if username.is_empty() {
            tracing::debug!("Login rejected: empty username");
            return VerificationResult::InvalidCredentials;
        }

        let identity = match self.directory.find_by_username(username).await {
            Ok(Some(identity)) if identity.is_active() => identity,
            Ok(Some(_)) => {
                tracing::debug!(username, "Login rejected: account disabled");
                self.check_dummy(secret).await;
                return VerificationResult::InvalidCredentials;
            }
            Ok(None) => {
                tracing::debug!(username, "Login rejected: unknown user");
                self.check_dummy(secret).await;
                return VerificationResult::InvalidCredentials;
            }
            Err(err) => {
                tracing::warn!(username, error = %err, "User directory failed during login");
                return VerificationResult::DirectoryError(err);
            }
        };

        let verdict = self.check_secret(secret, identity.credential.clone()).await;

        match verdict {
            Ok(true) => {
                tracing::debug!(username, identity = %identity.id, "Credentials verified");
                VerificationResult::Success(identity)
            }
            Ok(false) => {
                tracing::debug!(username, "Login rejected: secret mismatch");
                VerificationResult::InvalidCredentials
            }
            Err(err) => {
                tracing::error!(
                    username,
                    identity = %identity.id,
                    error = %err,
                    "Stored credential could not be checked"
                );
                VerificationResult::InvalidCredentials
            }
        }
    }

    /// Compare `secret` with a stored credential on the blocking pool
    async fn check_secret(&self, secret: &str, stored: String) -> AuthResult<bool> {
        let hasher = self.hasher.clone();
        let secret = secret.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify_password(&secret, &stored)).await?
    }

    /// Pay for a full verification when no account matches, discarding the verdict
    async fn check_dummy(&self, secret: &str) {
        let stored = match self.hasher.dummy_hash() {
            Ok(stored) => stored,
            Err(err) => {
                tracing::error!(error = %err, "Could not build dummy credential");
                return;
            }
        };
        let _ = self.check_secret(secret, stored).await;
    }
}
