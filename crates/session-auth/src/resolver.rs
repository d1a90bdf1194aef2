//! Per-request identity resolution

use crate::session::{SessionId, SessionRegistry};
use crate::{DirectoryError, Identity, UserDirectory};
use std::sync::Arc;

/// Turns a session id into a live identity on every call.
///
/// Nothing is cached between calls, so a deleted or disabled account loses
/// access on its next request.
pub struct IdentityResolver<D: ?Sized> {
    registry: Arc<SessionRegistry>,
    directory: Arc<D>,
}

impl<D> IdentityResolver<D>
where
    D: UserDirectory + ?Sized,
{
    pub fn new(registry: Arc<SessionRegistry>, directory: Arc<D>) -> Self {
        Self { registry, directory }
    }

    /// Resolve, reporting directory failures to the caller.
    ///
    /// A session whose identity is gone or disabled is invalidated. The
    /// registry is only touched after the directory answers, so dropping this
    /// future mid-lookup leaves it unchanged.
    pub async fn try_resolve(&self, session_id: &SessionId) -> Result<Option<Identity>, DirectoryError> {
        let Some(identity_id) = self.registry.lookup(session_id) else {
            return Ok(None);
        };

        match self.directory.find_by_id(&identity_id).await? {
            Some(identity) if identity.is_active() => Ok(Some(identity)),
            Some(_) => {
                tracing::info!(
                    session = %session_id.fingerprint(),
                    identity = %identity_id,
                    "Identity disabled, dropping session"
                );
                self.registry.invalidate(session_id);
                Ok(None)
            }
            None => {
                tracing::info!(
                    session = %session_id.fingerprint(),
                    identity = %identity_id,
                    "Identity no longer exists, dropping session"
                );
                self.registry.invalidate(session_id);
                Ok(None)
            }
        }
    }

    /// Resolve, treating directory failures as unauthenticated.
    ///
    /// The session is kept on directory failure since the outage may be
    /// transient.
    pub async fn resolve(&self, session_id: &SessionId) -> Option<Identity> {
        match self.try_resolve(session_id).await {
            Ok(identity) => identity,
            Err(err) => {
                tracing::warn!(
                    session = %session_id.fingerprint(),
                    error = %err,
                    "User directory failed during identity resolution"
                );
                None
            }
        }
    }
}
