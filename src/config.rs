//! Lookup configuration shared by embedders and the HTTP server.
//!
//! Both sections deserialize with defaults for every field, so an empty
//! document is a valid config: no table file (empty in-memory table) and the
//! tuned matcher constants.
//!
//! ```yaml
//! table:
//!   path: "data/documents.csv"
//! matching:
//!   min_score: 140
//!   min_gap: 40
//!   vocabulary: ["grade 1", "unit 1", "flip book"]
//! ```

use std::path::PathBuf;

use index::BackendConfig;
use matcher::MatchConfig;
use serde::{Deserialize, Serialize};

use crate::DocLinkError;

/// Where the reference table comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableConfig {
    /// CSV file with keyword, display name and link columns. `None` starts empty.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl TableConfig {
    pub fn backend(&self) -> BackendConfig {
        match &self.path {
            Some(path) => BackendConfig::csv(path.clone()),
            None => BackendConfig::in_memory(),
        }
    }
}

/// Top-level lookup configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocLinkConfig {
    #[serde(default)]
    pub table: TableConfig,
    #[serde(default)]
    pub matching: MatchConfig,
}

impl DocLinkConfig {
    pub fn validate(&self) -> Result<(), DocLinkError> {
        if let Some(path) = &self.table.path {
            if path.as_os_str().is_empty() {
                return Err(DocLinkError::InvalidConfig(
                    "table.path must not be empty when set".into(),
                ));
            }
        }
        self.matching.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let cfg: DocLinkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, DocLinkConfig::default());
        assert!(cfg.validate().is_ok());
        assert!(matches!(cfg.table.backend(), BackendConfig::InMemory));
    }

    #[test]
    fn path_selects_csv_backend() {
        let cfg: DocLinkConfig =
            serde_json::from_str(r#"{ "table": { "path": "docs.csv" } }"#).unwrap();
        match cfg.table.backend() {
            BackendConfig::Csv { path } => assert_eq!(path, PathBuf::from("docs.csv")),
            other => panic!("unexpected backend {other:?}"),
        }
    }

    #[test]
    fn empty_path_rejected() {
        let cfg = DocLinkConfig {
            table: TableConfig {
                path: Some(PathBuf::new()),
            },
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(DocLinkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn matching_errors_surface() {
        let cfg = DocLinkConfig {
            matching: MatchConfig {
                min_query_len: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(DocLinkError::Match(_))));
    }
}
