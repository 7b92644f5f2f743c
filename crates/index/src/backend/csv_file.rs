use std::io;
use std::path::{Path, PathBuf};

use crate::backend::TableBackend;
use crate::{IndexError, Record};

const KEYWORD_ALIASES: &[&str] = &["keyword", "keywords", "key", "tag"];
const NAME_ALIASES: &[&str] = &[
    "name",
    "displayname",
    "display name",
    "pdf name",
    "pdfname",
    "document",
    "document name",
    "title",
];
const LINK_ALIASES: &[&str] = &["link", "url", "pdf link", "pdflink", "href"];

/// Column positions of the three fields within a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    keyword: Option<usize>,
    name: Option<usize>,
    link: Option<usize>,
}

impl Columns {
    const POSITIONAL: Columns = Columns {
        keyword: Some(0),
        name: Some(1),
        link: Some(2),
    };

    /// Maps a header row onto columns; `None` if the row does not look like a header.
    fn from_header(row: &csv::StringRecord) -> Option<Columns> {
        let mut cols = Columns {
            keyword: None,
            name: None,
            link: None,
        };
        for (idx, cell) in row.iter().enumerate() {
            let label = header_label(cell);
            if cols.keyword.is_none() && KEYWORD_ALIASES.contains(&label.as_str()) {
                cols.keyword = Some(idx);
            } else if cols.name.is_none() && NAME_ALIASES.contains(&label.as_str()) {
                cols.name = Some(idx);
            } else if cols.link.is_none() && LINK_ALIASES.contains(&label.as_str()) {
                cols.link = Some(idx);
            }
        }
        if cols.name.is_some() || cols.link.is_some() {
            Some(cols)
        } else {
            None
        }
    }

    fn record(&self, row: &csv::StringRecord) -> Record {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or("");
        Record::new(cell(self.keyword), cell(self.name), cell(self.link))
    }
}

fn header_label(cell: &str) -> String {
    cell.trim_start_matches('\u{feff}')
        .trim()
        .to_ascii_lowercase()
        .replace(['_', '-'], " ")
}

/// Loads the table from a CSV file on every [`TableBackend::load`].
///
/// The first row is treated as a header when any cell names a known column
/// (`name`, `pdf name`, `link`, `url`, ...); otherwise columns are positional:
/// keyword, display name, link. Short rows are padded with empty fields and
/// rows that are blank in all three fields are skipped.
#[derive(Debug, Clone)]
pub struct CsvBackend {
    path: PathBuf,
}

impl CsvBackend {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses CSV rows from any reader.
    pub fn parse<R: io::Read>(reader: R) -> Result<Vec<Record>, IndexError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = rdr.records();
        let first = match rows.next() {
            Some(row) => row?,
            None => return Ok(Vec::new()),
        };

        let mut records = Vec::new();
        let columns = match Columns::from_header(&first) {
            Some(cols) => cols,
            None => {
                push_row(&mut records, Columns::POSITIONAL.record(&first), 1);
                Columns::POSITIONAL
            }
        };

        for (idx, row) in rows.enumerate() {
            push_row(&mut records, columns.record(&row?), idx + 2);
        }
        Ok(records)
    }
}

/// Keep only rows that can be matched by name and delivered.
fn push_row(records: &mut Vec<Record>, record: Record, line: usize) {
    if record.is_blank() {
        log::warn!("skipping blank table row {line}");
        return;
    }
    if record.normalized_display_name().is_empty() {
        log::warn!(
            "skipping table row {line} (keyword {:?}): display name is empty after normalization",
            record.keyword().unwrap_or_default()
        );
        return;
    }
    if record.link().is_empty() {
        log::warn!(
            "skipping table row {line} ({:?}): no link",
            record.display_name()
        );
        return;
    }
    records.push(record);
}

impl TableBackend for CsvBackend {
    fn load(&self) -> Result<Vec<Record>, IndexError> {
        let file = std::fs::File::open(&self.path).map_err(|e| {
            IndexError::Io(io::Error::new(
                e.kind(),
                format!("{}: {e}", self.path.display()),
            ))
        })?;
        let records = Self::parse(io::BufReader::new(file))?;
        log::info!(
            "loaded {} records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}
