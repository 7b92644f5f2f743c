use crate::{IndexError, Record};
use std::path::PathBuf;

mod csv_file;

pub use self::csv_file::CsvBackend;

/// A source the reference table can be (re)loaded from.
///
/// `load` returns the full row set every time; [`crate::RecordIndex`] owns
/// the swap, so backends never see readers.
pub trait TableBackend: Send + Sync {
    /// Read every row, in source order.
    fn load(&self) -> Result<Vec<Record>, IndexError>;
    /// Short human-readable label for logs and table metadata.
    fn describe(&self) -> String;
}

/// Configuration for selecting and building a backend.
///
/// ```
/// use index::BackendConfig;
///
/// let in_memory = BackendConfig::in_memory();
/// let csv = BackendConfig::csv("/data/documents.csv");
/// ```
#[derive(Clone, Debug, Default)]
pub enum BackendConfig {
    /// Flat CSV file with keyword, display name and link columns.
    Csv { path: PathBuf },
    /// Empty in-memory table; rows are pushed in with [`crate::RecordIndex::replace`].
    #[default]
    InMemory,
}

impl BackendConfig {
    pub fn in_memory() -> Self {
        BackendConfig::InMemory
    }

    pub fn csv<P: Into<PathBuf>>(path: P) -> Self {
        BackendConfig::Csv { path: path.into() }
    }

    pub fn build(&self) -> Box<dyn TableBackend> {
        match self {
            BackendConfig::InMemory => Box::new(InMemoryBackend::default()),
            BackendConfig::Csv { path } => Box::new(CsvBackend::new(path.clone())),
        }
    }
}

/// A fixed list of rows held in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    rows: Vec<Record>,
}

impl InMemoryBackend {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }
}

impl TableBackend for InMemoryBackend {
    fn load(&self) -> Result<Vec<Record>, IndexError> {
        Ok(self.rows.clone())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
