use serde::Serialize;

use super::{pairs, MatrixCell};
use crate::data::model::{FeatureList, GroupRows};
use crate::error::{DegenerateColumn, MatrixError};
use crate::stats;

/// Pearson correlation of every ordered feature pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub features: Vec<String>,
    pub cells: Vec<MatrixCell<f64>>,
    /// Zero-variance features; every cell touching one is `NaN`.
    pub degenerate: Vec<DegenerateColumn>,
}

impl CorrelationMatrix {
    /// Build the `|features|²` matrix over `rows`.
    ///
    /// The diagonal is exactly `1.0` and the matrix exactly symmetric for
    /// every feature with non-zero variance.
    pub fn build(rows: &GroupRows<'_>, features: &FeatureList) -> Result<Self, MatrixError> {
        let columns = rows.columns(features)?;
        Ok(Self::from_columns(features, &columns))
    }

    /// Same as [`build`](Self::build) over pre-extracted column vectors,
    /// aligned with `features`.
    pub fn from_columns(features: &FeatureList, columns: &[Vec<f64>]) -> Self {
        let n = features.len();
        let names = features.as_slice();

        let degenerate_flags: Vec<bool> = columns.iter().map(|c| stats::is_constant(c)).collect();
        let degenerate: Vec<DegenerateColumn> = names
            .iter()
            .zip(&degenerate_flags)
            .filter(|(_, d)| **d)
            .map(|(name, _)| DegenerateColumn {
                feature: name.clone(),
            })
            .collect();
        for d in &degenerate {
            log::warn!("{d}");
        }

        // Upper triangle once, mirrored below.
        let mut values = vec![f64::NAN; n * n];
        for i in 0..n {
            if degenerate_flags[i] {
                continue;
            }
            values[i * n + i] = 1.0;
            for j in (i + 1)..n {
                let r = stats::pearson(&columns[i], &columns[j]);
                values[i * n + j] = r;
                values[j * n + i] = r;
            }
        }

        let cells = pairs(n)
            .map(|(i, j)| MatrixCell {
                row_feature: names[i].clone(),
                col_feature: names[j].clone(),
                value: values[i * n + j],
            })
            .collect();

        CorrelationMatrix {
            features: names.to_vec(),
            cells,
            degenerate,
        }
    }

    /// Coefficient for a feature pair, `None` if either name is absent.
    pub fn coefficient(&self, row: &str, col: &str) -> Option<f64> {
        let n = self.features.len();
        let i = self.features.iter().position(|f| f == row)?;
        let j = self.features.iter().position(|f| f == col)?;
        self.cells.get(i * n + j).map(|c| c.value)
    }
}
