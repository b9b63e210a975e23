//! Process-local identity and history adapters.
//!
//! Used when no Firebase project is configured and by behaviour tests. State
//! lives only as long as the process; every identity gets its own history
//! namespace exactly as the remote store would provide.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::domain::ports::{
    HistoryStore, HistoryStoreError, IdentityProvider, IdentityProviderError,
};
use crate::domain::{Credentials, HistoryEntry, HistoryEntryId, Identity, NewHistoryEntry};

/// Shortest password the in-memory provider accepts, matching the hosted one.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// History store keeping every identity's entries in memory.
#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    namespaces: Mutex<HashMap<String, Vec<HistoryEntry>>>,
    next_key: AtomicU64,
}

impl InMemoryHistoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-padded counter keys sort in append order, like push ids.
    fn next_id(&self) -> HistoryEntryId {
        let key = self.next_key.fetch_add(1, Ordering::SeqCst);
        HistoryEntryId::new(format!("{key:020}"))
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append(
        &self,
        identity: &Identity,
        entry: NewHistoryEntry,
    ) -> Result<HistoryEntry, HistoryStoreError> {
        let entry = entry.into_entry(self.next_id());
        let mut namespaces = self
            .namespaces
            .lock()
            .map_err(|_| HistoryStoreError::connection("history store lock poisoned"))?;
        namespaces
            .entry(identity.uid().to_owned())
            .or_default()
            .push(entry.clone());
        debug!(uid = identity.uid(), key = %entry.id, "history entry appended");
        Ok(entry)
    }

    async fn recent(
        &self,
        identity: &Identity,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, HistoryStoreError> {
        let namespaces = self
            .namespaces
            .lock()
            .map_err(|_| HistoryStoreError::connection("history store lock poisoned"))?;
        let entries = namespaces
            .get(identity.uid())
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(entries[entries.len().saturating_sub(limit)..].to_vec())
    }
}

#[derive(Debug)]
struct Account {
    uid: String,
    password: Zeroizing<String>,
}

/// Identity provider holding accounts in memory.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
}

impl InMemoryIdentityProvider {
    /// Provider with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(uid: &str, email: &str) -> Identity {
        Identity::new(uid, email, Uuid::new_v4().simple().to_string())
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Identity, IdentityProviderError> {
        let accounts = self
            .accounts
            .lock()
            .map_err(|_| IdentityProviderError::transport("account lock poisoned"))?;
        let account = accounts
            .get(credentials.email())
            .ok_or(IdentityProviderError::AccountNotFound)?;
        if account.password.as_str() != credentials.password() {
            return Err(IdentityProviderError::InvalidCredentials);
        }
        Ok(Self::issue(&account.uid, credentials.email()))
    }

    async fn register(&self, credentials: &Credentials) -> Result<Identity, IdentityProviderError> {
        if !credentials.email().contains('@') {
            return Err(IdentityProviderError::InvalidEmail);
        }
        if credentials.password().chars().count() < MIN_PASSWORD_CHARS {
            return Err(IdentityProviderError::weak_password(format!(
                "use at least {MIN_PASSWORD_CHARS} characters"
            )));
        }
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| IdentityProviderError::transport("account lock poisoned"))?;
        if accounts.contains_key(credentials.email()) {
            return Err(IdentityProviderError::AccountExists);
        }
        let uid = Uuid::new_v4().simple().to_string();
        accounts.insert(
            credentials.email().to_owned(),
            Account {
                uid: uid.clone(),
                password: Zeroizing::new(credentials.password().to_owned()),
            },
        );
        debug!(%uid, "account registered");
        Ok(Self::issue(&uid, credentials.email()))
    }

    async fn sign_out(&self, identity: &Identity) -> Result<(), IdentityProviderError> {
        debug!(uid = identity.uid(), "signed out");
        Ok(())
    }
}
