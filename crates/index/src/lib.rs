//! # doclink index
//!
//! The reference table the matcher searches: a small, ordered list of
//! [`Record`]s (keyword, display name, link) loaded from a pluggable
//! [`TableBackend`].
//!
//! ## Snapshots
//!
//! [`RecordIndex`] holds the live table behind an `Arc`. Readers take a
//! snapshot with [`RecordIndex::snapshot`] and keep using it for the whole
//! query; a reload builds the next table completely and then swaps the
//! reference in a single assignment. A reader therefore sees either the old
//! table or the new one in full, never a mix, and readers never wait on a
//! load in progress.
//!
//! ```
//! use index::{InMemoryBackend, Record, RecordIndex};
//!
//! let backend = InMemoryBackend::new(vec![
//!     Record::new("welcome", "Grade 1 Welcome Letter", "https://example.com/welcome.pdf"),
//! ]);
//! let index = RecordIndex::new(Box::new(backend));
//! assert!(index.snapshot().is_empty());
//!
//! let table = index.reload().unwrap();
//! assert_eq!(table.len(), 1);
//! assert_eq!(table.generation(), 1);
//! ```

use std::sync::{Arc, RwLock};

use thiserror::Error;

mod backend;
mod record;

pub use crate::backend::{BackendConfig, CsvBackend, InMemoryBackend, TableBackend};
pub use crate::record::{Record, RecordTable};

/// Errors surfaced while loading the table.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(String),
    #[error("backend error: {0}")]
    Backend(String),
}

impl IndexError {
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        IndexError::Backend(msg.into())
    }
}

impl From<csv::Error> for IndexError {
    fn from(e: csv::Error) -> Self {
        IndexError::Csv(e.to_string())
    }
}

/// The live reference table plus the backend it reloads from.
pub struct RecordIndex {
    backend: Box<dyn TableBackend>,
    current: RwLock<Arc<RecordTable>>,
    // Serializes reloads so generations are assigned in swap order.
    reload_lock: std::sync::Mutex<()>,
}

impl RecordIndex {
    /// Wrap a backend. The table starts empty until [`RecordIndex::reload`].
    pub fn new(backend: Box<dyn TableBackend>) -> Self {
        let source = backend.describe();
        Self {
            backend,
            current: RwLock::new(Arc::new(RecordTable::empty(source))),
            reload_lock: std::sync::Mutex::new(()),
        }
    }

    /// Build from config and load once.
    pub fn open(config: &BackendConfig) -> Result<Self, IndexError> {
        let index = Self::new(config.build());
        index.reload()?;
        Ok(index)
    }

    /// The table currently live. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<RecordTable> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Load the backend and swap the result in. On error the live table is untouched.
    pub fn reload(&self) -> Result<Arc<RecordTable>, IndexError> {
        let _guard = self
            .reload_lock
            .lock()
            .map_err(|_| IndexError::backend("reload lock poisoned"))?;
        let records = match self.backend.load() {
            Ok(records) => records,
            Err(e) => {
                log::warn!(
                    "table reload from {} failed, keeping generation {}: {e}",
                    self.backend.describe(),
                    self.snapshot().generation()
                );
                return Err(e);
            }
        };
        Ok(self.install(records, self.backend.describe()))
    }

    /// Swap in caller-built rows without touching the backend.
    pub fn replace(&self, records: Vec<Record>, source: impl Into<String>) -> Arc<RecordTable> {
        let _guard = self
            .reload_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.install(records, source.into())
    }

    pub fn backend_description(&self) -> String {
        self.backend.describe()
    }

    fn install(&self, records: Vec<Record>, source: String) -> Arc<RecordTable> {
        let generation = self.snapshot().generation() + 1;
        let table = Arc::new(RecordTable::new(records, generation, source));
        let mut slot = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Arc::clone(&table);
        drop(slot);
        log::info!(
            "table generation {} live with {} records",
            table.generation(),
            table.len()
        );
        table
    }
}

impl std::fmt::Debug for RecordIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.snapshot();
        f.debug_struct("RecordIndex")
            .field("backend", &self.backend.describe())
            .field("generation", &table.generation())
            .field("records", &table.len())
            .finish()
    }
}
