use serde::{Deserialize, Serialize};

use super::model::{FeatureList, GroupKey};
use crate::error::DatasetError;

/// Maps a raw group code to the label rows are filed under,
/// e.g. `M` → `male`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAlias {
    pub code: String,
    pub label: String,
}

/// Layout of a delimited source table and which columns to pull from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    #[serde(default = "default_true")]
    pub has_headers: bool,

    /// Column names for headerless tables. Ignored when `has_headers` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_names: Option<Vec<String>>,

    pub group_column: String,

    pub features: FeatureList,

    /// Closed group vocabulary. Empty means every observed value is a group.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupAlias>,
}

fn default_delimiter() -> char {
    ','
}

fn default_true() -> bool {
    true
}

impl TableSchema {
    /// Comma-separated table with a header row and an open vocabulary.
    pub fn new(group_column: impl Into<String>, features: FeatureList) -> Self {
        TableSchema {
            delimiter: default_delimiter(),
            has_headers: true,
            column_names: None,
            group_column: group_column.into(),
            features,
            groups: Vec::new(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Headerless table whose columns carry these names.
    pub fn with_column_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.has_headers = false;
        self.column_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_group_alias(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.groups.push(GroupAlias {
            code: code.into(),
            label: label.into(),
        });
        self
    }

    pub(crate) fn delimiter_byte(&self) -> Result<u8, DatasetError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(DatasetError::InvalidDelimiter(self.delimiter))
        }
    }

    /// Reject aliases whose label collides with the unknown bucket.
    pub(crate) fn check_aliases(&self) -> Result<(), DatasetError> {
        match self
            .groups
            .iter()
            .find(|alias| alias.label.trim() == GroupKey::UNKNOWN_LABEL)
        {
            Some(alias) => Err(DatasetError::ReservedGroupLabel {
                code: alias.code.clone(),
                label: alias.label.clone(),
            }),
            None => Ok(()),
        }
    }

    /// File a raw (trimmed, non-empty) group value under its key.
    pub fn classify(&self, raw: &str) -> GroupKey {
        if self.groups.is_empty() {
            return GroupKey::named(raw);
        }
        self.groups
            .iter()
            .find(|alias| alias.code == raw)
            .map(|alias| GroupKey::named(alias.label.as_str()))
            .unwrap_or(GroupKey::Unknown)
    }

    // -- Presets for the two reference datasets --

    /// UCI abalone: headerless, sex encoded as `M`/`F`/`I`.
    pub fn abalone() -> Self {
        let features = [
            "Length",
            "Diameter",
            "Height",
            "Whole weight",
            "Shucked weight",
            "Viscera weight",
            "Shell weight",
            "Rings",
        ];
        let columns = std::iter::once("Sex").chain(features);
        TableSchema::new("Sex", feature_list(&features))
            .with_column_names(columns)
            .with_group_alias("M", "male")
            .with_group_alias("F", "female")
            .with_group_alias("I", "infant")
    }

    /// Iris with a header row and `class` as the group column.
    pub fn iris() -> Self {
        TableSchema::new(
            "class",
            feature_list(&["sepal length", "sepal width", "petal length", "petal width"]),
        )
    }
}

fn feature_list(names: &[&str]) -> FeatureList {
    FeatureList::from_distinct(names.iter().map(|n| n.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_vocabulary_buckets_unknown_codes() {
        let schema = TableSchema::abalone();
        assert_eq!(schema.classify("M"), GroupKey::named("male"));
        assert_eq!(schema.classify("I"), GroupKey::named("infant"));
        assert_eq!(schema.classify("X"), GroupKey::Unknown);
    }

    #[test]
    fn open_vocabulary_uses_raw_value() {
        let schema = TableSchema::iris();
        assert_eq!(schema.classify("setosa"), GroupKey::named("setosa"));
    }

    #[test]
    fn alias_may_not_claim_the_unknown_label() {
        assert!(TableSchema::abalone().check_aliases().is_ok());

        let schema = TableSchema::abalone().with_group_alias("U", "unknown");
        assert!(matches!(
            schema.check_aliases(),
            Err(DatasetError::ReservedGroupLabel { ref code, .. }) if code == "U"
        ));
    }

    #[test]
    fn delimiter_must_be_ascii() {
        let schema = TableSchema::iris().with_delimiter('§');
        assert!(matches!(
            schema.delimiter_byte(),
            Err(DatasetError::InvalidDelimiter('§'))
        ));
        assert_eq!(TableSchema::iris().with_delimiter('\t').delimiter_byte().unwrap(), b'\t');
    }

    #[test]
    fn schema_deserializes_with_defaults() {
        let schema: TableSchema = serde_json::from_str(
            r#"{ "group_column": "class", "features": ["a", "b"] }"#,
        )
        .unwrap();
        assert_eq!(schema.delimiter, ',');
        assert!(schema.has_headers);
        assert!(schema.groups.is_empty());
    }
}
