//! Optional append-only run ledger port.

use crate::schema::domain::LedgerEntry;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Append-only audit log of script outcomes.
///
/// The ledger is write-only from the runner's point of view; recovery after a
/// partial failure relies on re-running every script, never on ledger
/// contents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RunLedger: Send + Sync {
    /// Appends one entry.
    async fn append(&self, entry: &LedgerEntry) -> LedgerResult<()>;
}

/// Errors returned by ledger implementations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The entry could not be serialized.
    #[error("ledger serialization error: {0}")]
    Serialization(Arc<dyn std::error::Error + Send + Sync>),

    /// The ledger storage rejected the write.
    #[error("ledger storage error: {0}")]
    Storage(Arc<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    /// Wraps a serialization error.
    pub fn serialization(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Serialization(Arc::new(err))
    }

    /// Wraps a storage error.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage(Arc::new(err))
    }
}
