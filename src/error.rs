use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Record-level problems (recovered by skipping the record)
// ---------------------------------------------------------------------------

/// Why a single input record was left out of the dataset.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ParseError {
    #[error("record {record}: missing group key in column '{column}'")]
    MissingGroupKey { record: usize, column: String },

    #[error("record {record}: missing value for '{column}'")]
    MissingField { record: usize, column: String },

    #[error("record {record}: '{value}' in column '{column}' is not a finite number")]
    NonNumeric {
        record: usize,
        column: String,
        value: String,
    },
}

impl ParseError {
    /// The 1-based record (line) number the problem was found on.
    pub fn record(&self) -> usize {
        match self {
            ParseError::MissingGroupKey { record, .. }
            | ParseError::MissingField { record, .. }
            | ParseError::NonNumeric { record, .. } => *record,
        }
    }
}

// ---------------------------------------------------------------------------
// Table-level problems (fatal for a parse)
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("reading delimited text: {0}")]
    Csv(#[from] csv::Error),

    #[error("table has no column named '{0}'")]
    MissingColumn(String),

    #[error("feature '{0}' is listed more than once")]
    DuplicateFeature(String),

    #[error("feature list is empty")]
    EmptyFeatureList,

    #[error("delimiter {0:?} is not a single ASCII character")]
    InvalidDelimiter(char),

    #[error("table has no header row and no column names were given")]
    MissingColumnNames,

    #[error("group alias '{code}' uses the reserved label '{label}'")]
    ReservedGroupLabel { code: String, label: String },

    #[error("row {row} has {found} values but the feature list has {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

// ---------------------------------------------------------------------------
// Selection / build problems
// ---------------------------------------------------------------------------

/// A selection referenced a group the dataset does not contain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown group '{requested}' (available: {})", .available.join(", "))]
pub struct UnknownGroupError {
    pub requested: String,
    pub available: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("dataset has no feature named '{0}'")]
    UnknownFeature(String),

    #[error(transparent)]
    UnknownGroup(#[from] UnknownGroupError),
}

/// A zero-variance feature. Reported alongside a correlation matrix whose
/// cells for that feature are `NaN`; never raised as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("feature '{feature}' has zero variance; its correlations are undefined")]
pub struct DegenerateColumn {
    pub feature: String,
}
