//! Directory-owned identity records and the per-request user context

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, unique identifier of an identity in the user directory.
///
/// This is the only part of an identity a session stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for IdentityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A user record as materialized by the directory.
///
/// The core only reads identities; it never mutates them.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Directory identifier
    pub id: IdentityId,

    /// Login and display name
    pub username: String,

    /// Stored credential, interpreted by the configured password hasher
    pub credential: String,

    /// Role and claim names
    #[serde(default)]
    pub roles: Vec<String>,

    /// Disabled accounts can neither log in nor keep using a session
    #[serde(default)]
    pub disabled: bool,
}

impl Identity {
    /// Create an active identity without roles
    pub fn new(
        id: impl Into<IdentityId>,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            credential: credential.into(),
            roles: vec![],
            disabled: false,
        }
    }

    /// Attach roles
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_active(&self) -> bool {
        !self.disabled
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("credential", &"<redacted>")
            .field("roles", &self.roles)
            .field("disabled", &self.disabled)
            .finish()
    }
}

/// User context attached to a request after session authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserContext {
    /// User ID
    pub user_id: IdentityId,

    /// Username
    pub username: String,

    /// User roles
    pub roles: Vec<String>,

    /// Authentication provider used
    pub auth_provider: String,

    /// Time the identity was resolved for this request
    pub authenticated_at: DateTime<Utc>,

    /// Session expiration
    pub expires_at: Option<DateTime<Utc>>,
}

impl UserContext {
    /// Build a session-backed context for a freshly resolved identity
    pub fn from_identity(
        identity: &Identity,
        authenticated_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            user_id: identity.id.clone(),
            username: identity.username.clone(),
            roles: identity.roles.clone(),
            auth_provider: "session".to_string(),
            authenticated_at,
            expires_at,
        }
    }

    /// Check if user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if user has any of the specified roles
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }

    /// Check if user has all of the specified roles
    pub fn has_all_roles(&self, roles: &[&str]) -> bool {
        roles.iter().all(|role| self.has_role(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_credential() {
        let identity = Identity::new("u1", "jon", "s3cret");
        let rendered = format!("{:?}", identity);

        assert!(rendered.contains("jon"));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_user_context_role_checking() {
        let identity = Identity::new("u1", "jon", "hash").with_roles(["admin", "editor"]);
        let context = UserContext::from_identity(&identity, Utc::now(), None);

        assert_eq!(context.user_id, IdentityId::new("u1"));
        assert_eq!(context.auth_provider, "session");
        assert!(context.has_role("admin"));
        assert!(!context.has_role("viewer"));
        assert!(context.has_any_role(&["viewer", "editor"]));
        assert!(!context.has_any_role(&["viewer", "guest"]));
        assert!(context.has_all_roles(&["admin", "editor"]));
        assert!(!context.has_all_roles(&["admin", "viewer"]));
    }

    #[test]
    fn test_identity_id_serializes_transparently() {
        let id = IdentityId::new("u42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u42\"");
        assert_eq!(id.to_string(), "u42");
    }
}
