//! Opaque session identifiers

use crate::{AuthError, AuthResult, SessionIdGenerator};
use crate::config::{MAX_SESSION_ID_LENGTH, MIN_SESSION_ID_LENGTH};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use std::fmt;

/// Characters shown when a session id has to appear in logs
const FINGERPRINT_LEN: usize = 6;

/// Opaque, unguessable session identifier.
///
/// Treated as a secret: `Debug` is redacted and `Display` is not
/// implemented. Use [`SessionId::expose`] when handing it to the transport.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Validate an identifier presented by a client
    pub fn parse(raw: impl Into<String>) -> AuthResult<Self> {
        let raw = raw.into();

        if raw.len() < MIN_SESSION_ID_LENGTH || raw.len() > MAX_SESSION_ID_LENGTH {
            return Err(AuthError::InvalidSessionId);
        }

        if !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AuthError::InvalidSessionId);
        }

        Ok(Self(raw))
    }

    /// Raw value for cookies or headers
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short prefix safe for log correlation
    pub fn fingerprint(&self) -> String {
        let prefix: String = self.0.chars().take(FINGERPRINT_LEN).collect();
        format!("{}…", prefix)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.fingerprint())
    }
}

/// Draws alphanumeric identifiers from the operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRngGenerator;

impl SessionIdGenerator for OsRngGenerator {
    fn generate(&self, length: usize) -> String {
        OsRng
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}
