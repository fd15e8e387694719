/// Feature × feature grids built from one group's rows.
///
/// Architecture:
/// ```text
///   GroupRows + FeatureList
///        │
///        ├──────────────────────┐
///        ▼                      ▼
///   ┌──────────────┐      ┌──────────────┐
///   │ correlation  │      │    layout    │  scatter off the diagonal,
///   └──────────────┘      └──────────────┘  histogram on it
///        │                      │
///        ▼                      ▼
///   MatrixCell<f64>       MatrixCell<LayoutCell>
/// ```
///
/// Cells are emitted row-major: the row feature is held while the column
/// feature varies, both following the caller's feature order.
use serde::Serialize;

pub mod correlation;
pub mod layout;

pub use correlation::CorrelationMatrix;
pub use layout::{BrushRect, LayoutCell, MatrixLayout, ScatterCell, ScatterPoint};

/// One entry of a feature × feature grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixCell<V> {
    pub row_feature: String,
    pub col_feature: String,
    pub value: V,
}

impl<V> MatrixCell<V> {
    pub fn is_diagonal(&self) -> bool {
        self.row_feature == self.col_feature
    }
}

/// Visit every ordered feature pair in row-major order.
pub(crate) fn pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| (0..n).map(move |j| (i, j)))
}
