//! Driven port for the per-identity, append-only search history store.

use async_trait::async_trait;

use crate::domain::{HistoryEntry, Identity, NewHistoryEntry};

/// Errors surfaced by history store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryStoreError {
    /// Store connection could not be established.
    #[error("history store connection failed: {message}")]
    Connection { message: String },
    /// The store refused the caller's credentials.
    #[error("history store denied access: {message}")]
    Unauthorized { message: String },
    /// Stored data could not be encoded or decoded.
    #[error("history store payload invalid: {message}")]
    Serialization { message: String },
}

impl HistoryStoreError {
    /// Build a [`Self::Connection`] error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Build a [`Self::Unauthorized`] error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Build a [`Self::Serialization`] error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

/// Port for appending and reading search history under an identity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append an entry under the identity's namespace and return it with its key.
    async fn append(
        &self,
        identity: &Identity,
        entry: NewHistoryEntry,
    ) -> Result<HistoryEntry, HistoryStoreError>;

    /// Return up to `limit` of the newest entries, oldest first.
    async fn recent(
        &self,
        identity: &Identity,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, HistoryStoreError>;
}
