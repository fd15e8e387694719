use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{DatasetError, MatrixError, ParseError};

// ---------------------------------------------------------------------------
// GroupKey – the categorical label a row is filed under
// ---------------------------------------------------------------------------

/// Label of the group a row belongs to.
///
/// Rows whose key is outside a closed vocabulary land in [`GroupKey::Unknown`]
/// instead of being dropped. `Unknown` sorts after every named group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Named(String),
    Unknown,
}

impl GroupKey {
    pub const UNKNOWN_LABEL: &'static str = "unknown";

    pub fn named(label: impl Into<String>) -> Self {
        GroupKey::Named(label.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            GroupKey::Named(s) => s,
            GroupKey::Unknown => Self::UNKNOWN_LABEL,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FeatureList – ordered, duplicate-free numeric column names
// ---------------------------------------------------------------------------

/// The ordered feature names that define both axes of a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureList(Vec<String>);

impl FeatureList {
    pub fn new<I, S>(names: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(DatasetError::EmptyFeatureList);
        }
        let mut seen = BTreeSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(DatasetError::DuplicateFeature(name.clone()));
            }
        }
        Ok(FeatureList(names))
    }

    /// Caller guarantees `names` is non-empty and duplicate-free.
    pub(crate) fn from_distinct(names: Vec<String>) -> Self {
        debug_assert!(!names.is_empty());
        FeatureList(names)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|f| f == name)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl TryFrom<Vec<String>> for FeatureList {
    type Error = DatasetError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        FeatureList::new(names)
    }
}

impl From<FeatureList> for Vec<String> {
    fn from(list: FeatureList) -> Self {
        list.0
    }
}

// ---------------------------------------------------------------------------
// Row – one record of the source table
// ---------------------------------------------------------------------------

/// A parsed record: its group plus one value per dataset feature, in the
/// dataset's feature order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub group: GroupKey,
    pub values: Vec<f64>,
}

impl Row {
    pub fn new(group: GroupKey, values: Vec<f64>) -> Self {
        Row { group, values }
    }
}

// ---------------------------------------------------------------------------
// ParseReport – what was dropped on the way in
// ---------------------------------------------------------------------------

/// Accounting of a parse: every record is either kept, blank, or skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseReport {
    /// Non-blank records seen after the header.
    pub records_read: usize,
    /// Records that became rows.
    pub rows_kept: usize,
    /// Records with every field empty (e.g. a trailing newline record).
    pub blank_records: usize,
    /// Records left out, with the reason for each.
    pub skipped: Vec<ParseError>,
}

impl ParseReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete parsed table
// ---------------------------------------------------------------------------

/// Immutable parsed dataset with a pre-computed group index.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: FeatureList,
    rows: Vec<Row>,
    /// Group key → row indices, in insertion order.
    groups: BTreeMap<GroupKey, Vec<usize>>,
    all: Vec<usize>,
    report: ParseReport,
}

impl Dataset {
    /// Build the group index from already parsed rows.
    pub fn from_rows(
        features: FeatureList,
        rows: Vec<Row>,
        report: ParseReport,
    ) -> Result<Self, DatasetError> {
        let mut groups: BTreeMap<GroupKey, Vec<usize>> = BTreeMap::new();
        for (i, row) in rows.iter().enumerate() {
            if row.values.len() != features.len() {
                return Err(DatasetError::RowWidth {
                    row: i,
                    expected: features.len(),
                    found: row.values.len(),
                });
            }
            groups.entry(row.group.clone()).or_default().push(i);
        }
        let all = (0..rows.len()).collect();
        Ok(Dataset {
            features,
            rows,
            groups,
            all,
            report,
        })
    }

    pub fn features(&self) -> &FeatureList {
        &self.features
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn report(&self) -> &ParseReport {
        &self.report
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Group keys in sorted order (`unknown` last).
    pub fn group_keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.keys()
    }

    /// Look a group up by its display label.
    pub fn find_group(&self, label: &str) -> Option<&GroupKey> {
        self.groups.keys().find(|k| k.as_str() == label)
    }

    pub fn group(&self, key: &GroupKey) -> Option<GroupRows<'_>> {
        self.groups.get(key).map(|indices| GroupRows {
            dataset: self,
            indices,
        })
    }

    /// Every row regardless of group.
    pub fn all_rows(&self) -> GroupRows<'_> {
        GroupRows {
            dataset: self,
            indices: &self.all,
        }
    }
}

// ---------------------------------------------------------------------------
// GroupRows – a borrowed view of one partition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct GroupRows<'a> {
    dataset: &'a Dataset,
    indices: &'a [usize],
}

impl<'a> GroupRows<'a> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Indices into [`Dataset::rows`].
    pub fn indices(&self) -> &'a [usize] {
        self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Row> + 'a {
        let dataset: &'a Dataset = self.dataset;
        let rows = &dataset.rows;
        self.indices.iter().map(move |&i| &rows[i])
    }

    /// Column vector of one feature over this view.
    pub fn column(&self, feature: &str) -> Result<Vec<f64>, MatrixError> {
        let idx = self
            .dataset
            .features
            .position(feature)
            .ok_or_else(|| MatrixError::UnknownFeature(feature.to_string()))?;
        Ok(self.iter().map(|row| row.values[idx]).collect())
    }

    /// Column vectors for `features`, in that order.
    pub fn columns(&self, features: &FeatureList) -> Result<Vec<Vec<f64>>, MatrixError> {
        features.iter().map(|f| self.column(f)).collect()
    }
}
