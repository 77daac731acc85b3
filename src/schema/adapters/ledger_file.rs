//! JSON-lines run ledger stored through a capability-scoped directory.

use crate::schema::{
    domain::LedgerEntry,
    ports::{LedgerError, LedgerResult, RunLedger},
};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::{Dir, OpenOptions};
use std::io::Write;
use std::sync::Arc;

/// Default ledger file name inside the ledger directory.
pub const LEDGER_FILE_NAME: &str = "strata-runs.jsonl";

/// Appends one JSON object per line to a file in a fixed directory.
///
/// Writes run on the blocking thread pool; the directory handle is opened
/// once and every file access is scoped to it.
#[derive(Debug, Clone)]
pub struct JsonLinesRunLedger {
    dir: Arc<Dir>,
    file_name: Utf8PathBuf,
}

impl JsonLinesRunLedger {
    /// Opens (creating if needed) `directory` and logs to
    /// [`LEDGER_FILE_NAME`] inside it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the directory cannot be created
    /// or opened.
    pub fn open(directory: &Utf8Path) -> LedgerResult<Self> {
        Dir::create_ambient_dir_all(directory, ambient_authority()).map_err(LedgerError::storage)?;
        let dir =
            Dir::open_ambient_dir(directory, ambient_authority()).map_err(LedgerError::storage)?;
        Ok(Self {
            dir: Arc::new(dir),
            file_name: Utf8PathBuf::from(LEDGER_FILE_NAME),
        })
    }

    /// Uses `file_name` instead of [`LEDGER_FILE_NAME`].
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<Utf8PathBuf>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Reads every recorded entry back in append order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] when the file cannot be read and
    /// [`LedgerError::Serialization`] when a line does not decode.
    pub async fn read_entries(&self) -> LedgerResult<Vec<LedgerEntry>> {
        let dir = Arc::clone(&self.dir);
        let file_name = self.file_name.clone();
        tokio::task::spawn_blocking(move || {
            if !dir.exists(&file_name) {
                return Ok(Vec::new());
            }
            let contents = dir
                .read_to_string(&file_name)
                .map_err(LedgerError::storage)?;
            contents
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| serde_json::from_str(line).map_err(LedgerError::serialization))
                .collect()
        })
        .await
        .map_err(LedgerError::storage)?
    }
}

#[async_trait]
impl RunLedger for JsonLinesRunLedger {
    async fn append(&self, entry: &LedgerEntry) -> LedgerResult<()> {
        let mut line = serde_json::to_vec(entry).map_err(LedgerError::serialization)?;
        line.push(b'\n');
        let dir = Arc::clone(&self.dir);
        let file_name = self.file_name.clone();

        tokio::task::spawn_blocking(move || {
            let mut options = OpenOptions::new();
            options.create(true).append(true);
            let mut file = dir
                .open_with(&file_name, &options)
                .map_err(LedgerError::storage)?;
            file.write_all(&line).map_err(LedgerError::storage)?;
            file.flush().map_err(LedgerError::storage)
        })
        .await
        .map_err(LedgerError::storage)?
    }
}
