use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::schema::TableSchema;
use crate::stats::BinPolicy;

/// Everything needed to turn a source file into matrices.
///
/// ```json
/// {
///   "table": {
///     "group_column": "class",
///     "features": ["sepal length", "sepal width"]
///   },
///   "bins": { "even": 15 },
///   "default_group": "setosa"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    pub table: TableSchema,

    #[serde(default)]
    pub bins: BinPolicy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_group: Option<String>,
}

impl LatticeConfig {
    pub fn new(table: TableSchema) -> Self {
        LatticeConfig {
            table,
            bins: BinPolicy::default(),
            default_group: None,
        }
    }

    /// Read a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: LatticeConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::debug!("Loaded config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Built-in configuration by name.
    pub fn preset(name: &str) -> Result<Self> {
        let config = match name {
            "abalone" => LatticeConfig {
                default_group: Some("male".to_string()),
                ..LatticeConfig::new(TableSchema::abalone())
            },
            "iris" => LatticeConfig::new(TableSchema::iris()),
            other => bail!("Unknown preset '{other}' (expected 'abalone' or 'iris')"),
        };
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn presets_resolve() {
        let abalone = LatticeConfig::preset("abalone").unwrap();
        assert_eq!(abalone.table.features.len(), 8);
        assert_eq!(abalone.default_group.as_deref(), Some("male"));
        assert_eq!(LatticeConfig::preset("iris").unwrap().table.group_column, "class");
        assert!(LatticeConfig::preset("titanic").is_err());
    }

    #[test]
    fn reads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "table": {{ "group_column": "g", "features": ["x", "y"], "delimiter": ";" }},
                "bins": {{ "nice": 8 }}
            }}"#
        )
        .unwrap();

        let config = LatticeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.table.delimiter, ';');
        assert!(matches!(config.bins, BinPolicy::Nice(n) if n.get() == 8));
        assert!(config.default_group.is_none());
    }

    #[test]
    fn rejects_invalid_feature_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "table": {{ "group_column": "g", "features": [] }} }}"#).unwrap();
        assert!(LatticeConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn round_trips_through_json() {
        let config = LatticeConfig::preset("abalone").unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: LatticeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
