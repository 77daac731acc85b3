//! In-memory run ledger.

use crate::schema::{
    domain::LedgerEntry,
    ports::{LedgerError, LedgerResult, RunLedger},
};
use async_trait::async_trait;
use std::sync::{Arc, PoisonError, RwLock};

/// Thread-safe ledger that keeps entries in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunLedger {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl InMemoryRunLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded entries in append order.
    #[must_use]
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RunLedger for InMemoryRunLedger {
    async fn append(&self, entry: &LedgerEntry) -> LedgerResult<()> {
        self.entries
            .write()
            .map_err(|err| LedgerError::storage(std::io::Error::other(err.to_string())))?
            .push(entry.clone());
        Ok(())
    }
}
