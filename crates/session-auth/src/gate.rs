//! Authentication gate: login, per-request authentication and logout
//!
//! A client moves from anonymous to authenticated through [`AuthenticationGate::login`]
//! and back through [`AuthenticationGate::logout`] or session expiry. Every
//! request in between is re-resolved against the directory.

use crate::clock::SystemClock;
use crate::cookie::SessionCookie;
use crate::password::PasswordHasherFactory;
use crate::resolver::IdentityResolver;
use crate::session::{OsRngGenerator, SessionId, SessionRegistry, SessionSweeper};
use crate::verifier::CredentialVerifier;
use crate::{
    AuthConfig, AuthResult, Clock, Identity, PasswordHasher, SessionConfig, SessionIdGenerator,
    UserContext, UserDirectory,
};
use std::sync::Arc;

/// Entry point used by the transport layer
pub struct AuthenticationGate<D: ?Sized> {
    verifier: CredentialVerifier<D>,
    resolver: IdentityResolver<D>,
    registry: Arc<SessionRegistry>,
    cookie: SessionCookie,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl<D> AuthenticationGate<D>
where
    D: UserDirectory + ?Sized,
{
    /// Build a gate from validated configuration
    pub fn new(directory: Arc<D>, config: &AuthConfig) -> AuthResult<Self> {
        config.validate()?;
        let hasher: Arc<dyn PasswordHasher> = PasswordHasherFactory::from_config(&config.password)?.into();

        Self::with_parts(
            directory,
            config.session.clone(),
            hasher,
            Arc::new(OsRngGenerator),
            Arc::new(SystemClock),
        )
    }

    /// Build a gate with every collaborator injected
    pub fn with_parts(
        directory: Arc<D>,
        config: SessionConfig,
        hasher: Arc<dyn PasswordHasher>,
        generator: Arc<dyn SessionIdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> AuthResult<Self> {
        config.validate()?;
        let cookie = SessionCookie::from_config(&config)?;
        let registry = Arc::new(SessionRegistry::with_parts(&config, generator, clock.clone()));

        Ok(Self {
            verifier: CredentialVerifier::new(directory.clone(), hasher),
            resolver: IdentityResolver::new(registry.clone(), directory),
            cookie,
            registry,
            clock,
            config,
        })
    }

    /// Check credentials and open a session.
    ///
    /// Failures keep their cause (`InvalidCredentials`, `DirectoryUnavailable`,
    /// `CollisionRetryExhausted`); use [`AuthError::public_message`](crate::AuthError::public_message)
    /// for anything shown to the end user.
    pub async fn login(&self, username: &str, secret: &str) -> AuthResult<SessionId> {
        let identity = match self.verifier.verify(username, secret).await.into_result() {
            Ok(identity) => identity,
            Err(err) => {
                tracing::info!(code = err.error_code(), "Login failed");
                return Err(err);
            }
        };

        let session_id = self.registry.create(identity.id.clone(), self.config.ttl_duration())?;
        tracing::info!(
            identity = %identity.id,
            session = %session_id.fingerprint(),
            "Login succeeded"
        );
        Ok(session_id)
    }

    /// Identity behind a session, or `None` for an anonymous request
    pub async fn authenticate(&self, session_id: &SessionId) -> Option<Identity> {
        self.resolver.resolve(session_id).await
    }

    /// Request context for a session, or `None` for an anonymous request
    pub async fn authenticate_context(&self, session_id: &SessionId) -> Option<UserContext> {
        let identity = self.resolver.resolve(session_id).await?;
        let expires_at = self.registry.expires_at(session_id);
        Some(UserContext::from_identity(&identity, self.clock.now(), expires_at))
    }

    /// Authenticate straight from a `Cookie` request header
    pub async fn authenticate_cookie(&self, cookie_header: &str) -> Option<Identity> {
        let session_id = self.cookie.extract(cookie_header)?;
        self.authenticate(&session_id).await
    }

    /// End a session. Always succeeds, even if the session is already gone.
    pub fn logout(&self, session_id: &SessionId) {
        self.registry.invalidate(session_id);
    }

    /// Start sweeping expired sessions at the configured interval
    pub fn spawn_sweeper(&self) -> SessionSweeper {
        SessionSweeper::spawn(self.registry.clone(), self.config.sweep_interval_duration())
    }

    /// Session registry, for attribute access
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Cookie settings for issuing and clearing the session cookie
    pub fn cookie(&self) -> &SessionCookie {
        &self.cookie
    }
}
