//! # Rusty Lattice
//!
//! Turns a grouped table of numeric features into the matrices behind a
//! correlation heatmap or a scatter-plot matrix.
//!
//! ## Modules
//!
//! - `data` - Table schema, parsing, file loading and the grouped `Dataset`
//! - `matrix` - Correlation matrix and scatter/histogram layout
//! - `scale` - Extents, outward rounding and nice axis domains
//! - `stats` - Pearson correlation and histogram binning
//! - `state` - Group selector that rebuilds on every change
//! - `color` - Diverging and categorical colour scales
//! - `config` - JSON configuration and built-in presets

pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod matrix;
pub mod scale;
pub mod state;
pub mod stats;

pub use config::LatticeConfig;
pub use data::loader::load_file;
pub use data::model::{Dataset, FeatureList, GroupKey, GroupRows, ParseReport, Row};
pub use data::schema::{GroupAlias, TableSchema};
pub use error::{DatasetError, DegenerateColumn, MatrixError, ParseError, UnknownGroupError};
pub use matrix::{BrushRect, CorrelationMatrix, LayoutCell, MatrixCell, MatrixLayout};
pub use state::{MatrixCells, MatrixSelector, MatrixSnapshot, SnapshotStatus, ViewMode};
pub use stats::{BinPolicy, Histogram};
