//! In-memory user directory

use crate::{DirectoryError, Identity, IdentityId, UserDirectory};
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;

/// User directory held in memory.
///
/// Meant for tests and local development. An optional latency is applied to
/// every lookup to mimic a remote store.
#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    by_id: DashMap<IdentityId, Identity>,
    username_index: DashMap<String, IdentityId>,
    latency: Option<Duration>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every lookup by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Add or replace an identity
    pub fn insert(&self, identity: Identity) {
        if let Some(previous) = self.by_id.get(&identity.id).map(|existing| existing.username.clone()) {
            self.username_index.remove(&previous);
        }
        self.username_index.insert(identity.username.clone(), identity.id.clone());
        self.by_id.insert(identity.id.clone(), identity);
    }

    /// Delete an identity, returning it if present
    pub fn remove(&self, id: &IdentityId) -> Option<Identity> {
        let (_, identity) = self.by_id.remove(id)?;
        self.username_index.remove(&identity.username);
        Some(identity)
    }

    /// Enable or disable an account. Returns false if the identity is unknown.
    pub fn set_disabled(&self, id: &IdentityId, disabled: bool) -> bool {
        match self.by_id.get_mut(id) {
            Some(mut identity) => {
                identity.disabled = disabled;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, DirectoryError> {
        self.simulate_latency().await;
        let id = match self.username_index.get(username) {
            Some(id) => id.value().clone(),
            None => return Ok(None),
        };
        Ok(self.by_id.get(&id).map(|identity| identity.value().clone()))
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, DirectoryError> {
        self.simulate_latency().await;
        Ok(self.by_id.get(id).map(|identity| identity.value().clone()))
    }
}
