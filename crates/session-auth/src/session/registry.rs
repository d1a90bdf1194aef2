//! In-memory session registry

use crate::clock::SystemClock;
use crate::config::{MAX_SESSION_ID_LENGTH, MIN_SESSION_ID_LENGTH};
use crate::session::id::{OsRngGenerator, SessionId};
use crate::{AuthError, AuthResult, Clock, IdentityId, SessionConfig, SessionIdGenerator};
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Server-held binding between a session id and an identity
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub identity_id: IdentityId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Arbitrary data scoped to this session
    pub attributes: HashMap<String, Value>,
}

impl Session {
    /// Expired once `now` reaches `expires_at`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Concurrent store of live sessions.
///
/// Every method is synchronous and holds a shard lock only for the duration
/// of the map operation, so callers can share the registry freely across
/// tasks without coordinating. Never-issued, expired and revoked sessions
/// all look the same from outside: absent.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
    generator: Arc<dyn SessionIdGenerator>,
    clock: Arc<dyn Clock>,
    id_length: usize,
    max_id_attempts: u32,
    sliding_ttl: Option<chrono::Duration>,
}

impl SessionRegistry {
    /// Registry backed by the OS random source and the system clock
    pub fn new(config: &SessionConfig) -> Self {
        Self::with_parts(config, Arc::new(OsRngGenerator), Arc::new(SystemClock))
    }

    /// Registry with injected id source and clock.
    ///
    /// `id_length` is clamped to the range [`SessionId::parse`] accepts.
    pub fn with_parts(
        config: &SessionConfig,
        generator: Arc<dyn SessionIdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sliding_ttl = if config.sliding_expiration {
            chrono::Duration::from_std(config.ttl_duration()).ok()
        } else {
            None
        };

        Self {
            sessions: DashMap::new(),
            generator,
            clock,
            id_length: config.id_length.clamp(MIN_SESSION_ID_LENGTH, MAX_SESSION_ID_LENGTH),
            max_id_attempts: config.max_id_attempts.max(1),
            sliding_ttl,
        }
    }

    /// Mint a session for `identity_id` that expires after `ttl`.
    ///
    /// A candidate id already present in the map is never overwritten; a new
    /// one is drawn instead, up to the configured attempt budget.
    pub fn create(&self, identity_id: IdentityId, ttl: Duration) -> AuthResult<SessionId> {
        if ttl.is_zero() {
            return Err(AuthError::invalid_input("session ttl must be greater than zero"));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| AuthError::invalid_input("session ttl out of range"))?;

        for attempt in 1..=self.max_id_attempts {
            let id = match SessionId::parse(self.generator.generate(self.id_length)) {
                Ok(id) => id,
                Err(_) => {
                    tracing::warn!(attempt, "Session id generator produced a malformed id");
                    continue;
                }
            };

            match self.sessions.entry(id.clone()) {
                Entry::Occupied(_) => {
                    tracing::warn!(attempt, "Session id collision, regenerating");
                }
                Entry::Vacant(slot) => {
                    let now = self.clock.now();
                    slot.insert(Session {
                        id: id.clone(),
                        identity_id: identity_id.clone(),
                        created_at: now,
                        expires_at: now + ttl,
                        attributes: HashMap::new(),
                    });
                    tracing::info!(
                        session = %id.fingerprint(),
                        identity = %identity_id,
                        "Session created"
                    );
                    return Ok(id);
                }
            }
        }

        tracing::error!(
            attempts = self.max_id_attempts,
            "Session id generation exhausted its retries; the random source looks broken"
        );
        Err(AuthError::CollisionRetryExhausted { attempts: self.max_id_attempts })
    }

    /// Identity bound to a live session.
    ///
    /// Expired entries are dropped on the spot. With sliding expiration the
    /// session's expiry is pushed forward.
    pub fn lookup(&self, id: &SessionId) -> Option<IdentityId> {
        let now = self.clock.now();

        {
            let mut session = self.sessions.get_mut(id)?;
            if !session.is_expired_at(now) {
                if let Some(ttl) = self.sliding_ttl {
                    session.expires_at = now + ttl;
                }
                return Some(session.identity_id.clone());
            }
        }

        if self.sessions.remove_if(id, |_, session| session.is_expired_at(now)).is_some() {
            tracing::debug!(session = %id.fingerprint(), "Expired session removed on lookup");
        }
        None
    }

    /// Remove a session. Absent sessions are ignored.
    pub fn invalidate(&self, id: &SessionId) {
        if let Some((_, session)) = self.sessions.remove(id) {
            tracing::info!(
                session = %id.fingerprint(),
                identity = %session.identity_id,
                "Session invalidated"
            );
        }
    }

    /// Remove every expired session, returning how many were dropped
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;

        self.sessions.retain(|_, session| {
            if session.is_expired_at(now) {
                removed += 1;
                false
            } else {
                true
            }
        });

        if removed > 0 {
            tracing::debug!(removed, remaining = self.sessions.len(), "Swept expired sessions");
        }
        removed
    }

    /// Snapshot of a live session
    pub fn session(&self, id: &SessionId) -> Option<Session> {
        let now = self.clock.now();
        self.sessions
            .get(id)
            .filter(|session| !session.is_expired_at(now))
            .map(|session| session.value().clone())
    }

    /// Expiry of a live session
    pub fn expires_at(&self, id: &SessionId) -> Option<DateTime<Utc>> {
        self.session(id).map(|session| session.expires_at)
    }

    /// Store a value in the session's attribute bag
    pub fn set_attribute(&self, id: &SessionId, key: impl Into<String>, value: Value) -> AuthResult<()> {
        let now = self.clock.now();
        let mut session = self
            .sessions
            .get_mut(id)
            .filter(|session| !session.is_expired_at(now))
            .ok_or(AuthError::Unauthenticated)?;
        session.attributes.insert(key.into(), value);
        Ok(())
    }

    /// Read a value from the session's attribute bag
    pub fn attribute(&self, id: &SessionId, key: &str) -> Option<Value> {
        let now = self.clock.now();
        self.sessions
            .get(id)
            .filter(|session| !session.is_expired_at(now))
            .and_then(|session| session.attributes.get(key).cloned())
    }

    /// Remove a value from the session's attribute bag
    pub fn remove_attribute(&self, id: &SessionId, key: &str) -> AuthResult<Option<Value>> {
        let now = self.clock.now();
        let mut session = self
            .sessions
            .get_mut(id)
            .filter(|session| !session.is_expired_at(now))
            .ok_or(AuthError::Unauthenticated)?;
        Ok(session.attributes.remove(key))
    }

    /// Number of stored sessions, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
