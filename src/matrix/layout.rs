use std::collections::BTreeSet;

use serde::Serialize;

use super::{pairs, MatrixCell};
use crate::data::model::{FeatureList, GroupRows};
use crate::error::MatrixError;
use crate::scale::{self, Domain};
use crate::stats::{BinPolicy, Histogram};

/// Tick count the y-axis domain is niced for.
const NICE_TICKS: usize = 10;

// ---------------------------------------------------------------------------
// Cell contents
// ---------------------------------------------------------------------------

/// One dot of a scatter cell, in normalized `[0, 1]` coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    /// Index into [`Dataset::rows`](crate::data::model::Dataset::rows).
    pub row: usize,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterCell {
    /// `[floor(min), ceil(max)]` of the row feature.
    pub x_domain: Domain,
    /// Niced extent of the column feature.
    pub y_domain: Domain,
    pub points: Vec<ScatterPoint>,
}

/// Rectangle in normalized cell coordinates; bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BrushRect {
    /// Corners in any order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        BrushRect {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    fn contains(&self, p: &ScatterPoint) -> bool {
        self.x0 <= p.x && p.x <= self.x1 && self.y0 <= p.y && p.y <= self.y1
    }
}

impl ScatterCell {
    /// Rows whose point lies inside `rect`.
    pub fn select(&self, rect: &BrushRect) -> BTreeSet<usize> {
        self.points
            .iter()
            .filter(|p| rect.contains(p))
            .map(|p| p.row)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayoutCell {
    Scatter(ScatterCell),
    Histogram(Histogram),
    /// No rows to place.
    Empty,
}

// ---------------------------------------------------------------------------
// MatrixLayout
// ---------------------------------------------------------------------------

/// Scatter-plot matrix: a point cloud for every off-diagonal feature pair
/// and a histogram on the diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixLayout {
    pub features: Vec<String>,
    pub cells: Vec<MatrixCell<LayoutCell>>,
}

/// Per-feature axis domains, derived once and shared by every cell.
struct Axes {
    floor_ceil: Option<Domain>,
    nice: Option<Domain>,
}

impl MatrixLayout {
    pub fn layout(
        rows: &GroupRows<'_>,
        features: &FeatureList,
        policy: BinPolicy,
    ) -> Result<Self, MatrixError> {
        let columns = rows.columns(features)?;
        let row_ids = rows.indices();
        let names = features.as_slice();

        let axes: Vec<Axes> = columns
            .iter()
            .map(|c| {
                let extent = scale::extent(c);
                Axes {
                    floor_ceil: extent.map(scale::floor_ceil),
                    nice: extent.map(|e| scale::nice(e, NICE_TICKS)),
                }
            })
            .collect();

        let cells = pairs(features.len())
            .map(|(i, j)| {
                let value = if i == j {
                    Histogram::build(&columns[i], policy)
                        .map(LayoutCell::Histogram)
                        .unwrap_or(LayoutCell::Empty)
                } else {
                    scatter(&columns[i], &columns[j], &axes[i], &axes[j], row_ids)
                };
                MatrixCell {
                    row_feature: names[i].clone(),
                    col_feature: names[j].clone(),
                    value,
                }
            })
            .collect();

        log::debug!(
            "Laid out {}x{} matrix over {} rows",
            features.len(),
            features.len(),
            rows.len()
        );

        Ok(MatrixLayout {
            features: names.to_vec(),
            cells,
        })
    }

    pub fn cell(&self, row: &str, col: &str) -> Option<&MatrixCell<LayoutCell>> {
        let n = self.features.len();
        let i = self.features.iter().position(|f| f == row)?;
        let j = self.features.iter().position(|f| f == col)?;
        self.cells.get(i * n + j)
    }

    /// Rows selected by brushing the `(row, col)` scatter cell. `None` when
    /// that cell does not exist or is not a scatter plot.
    pub fn brush(&self, row: &str, col: &str, rect: &BrushRect) -> Option<BTreeSet<usize>> {
        match &self.cell(row, col)?.value {
            LayoutCell::Scatter(s) => Some(s.select(rect)),
            _ => None,
        }
    }
}

fn scatter(xs: &[f64], ys: &[f64], x_axis: &Axes, y_axis: &Axes, row_ids: &[usize]) -> LayoutCell {
    let (Some(x_domain), Some(y_domain)) = (x_axis.floor_ceil, y_axis.nice) else {
        return LayoutCell::Empty;
    };
    let points = row_ids
        .iter()
        .zip(xs.iter().zip(ys))
        .map(|(&row, (&x, &y))| ScatterPoint {
            row,
            x: x_domain.normalize(x),
            y: y_domain.normalize(y),
        })
        .collect();
    LayoutCell::Scatter(ScatterCell {
        x_domain,
        y_domain,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Dataset, GroupKey, ParseReport, Row};

    fn dataset() -> Dataset {
        let features = FeatureList::new(["len", "wid"]).unwrap();
        let rows = vec![
            Row::new(GroupKey::named("a"), vec![4.3, 0.13]),
            Row::new(GroupKey::named("b"), vec![6.1, 0.5]),
            Row::new(GroupKey::named("a"), vec![7.9, 0.97]),
        ];
        Dataset::from_rows(features, rows, ParseReport::default()).unwrap()
    }

    fn scatter_at<'a>(layout: &'a MatrixLayout, row: &str, col: &str) -> &'a ScatterCell {
        match &layout.cell(row, col).unwrap().value {
            LayoutCell::Scatter(s) => s,
            other => panic!("expected scatter, got {other:?}"),
        }
    }

    #[test]
    fn off_diagonal_domains_are_asymmetric() {
        let ds = dataset();
        let layout = MatrixLayout::layout(&ds.all_rows(), ds.features(), BinPolicy::default()).unwrap();

        let s = scatter_at(&layout, "len", "wid");
        assert_eq!(s.x_domain, Domain::new(4.0, 8.0));
        assert_eq!(s.y_domain, Domain::new(0.1, 1.0));

        let t = scatter_at(&layout, "wid", "len");
        assert_eq!(t.x_domain, Domain::new(0.0, 1.0));
        assert_eq!(t.y_domain, Domain::new(4.0, 8.0));
    }

    #[test]
    fn points_are_normalized_and_tagged_with_rows() {
        let ds = dataset();
        let layout = MatrixLayout::layout(&ds.all_rows(), ds.features(), BinPolicy::default()).unwrap();
        let s = scatter_at(&layout, "len", "wid");
        assert_eq!(s.points.len(), 3);
        assert_eq!(s.points[0].row, 0);
        assert!((s.points[0].x - 0.075).abs() < 1e-12);
        assert!(s.points.iter().all(|p| (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y)));
    }

    #[test]
    fn huge_spread_still_lands_in_unit_square() {
        let features = FeatureList::new(["len", "wid"]).unwrap();
        let rows = vec![
            Row::new(GroupKey::named("a"), vec![1.0, -1e308]),
            Row::new(GroupKey::named("a"), vec![2.0, 0.0]),
            Row::new(GroupKey::named("a"), vec![3.0, 1e308]),
        ];
        let ds = Dataset::from_rows(features, rows, ParseReport::default()).unwrap();
        let layout = MatrixLayout::layout(&ds.all_rows(), ds.features(), BinPolicy::default()).unwrap();

        let s = scatter_at(&layout, "len", "wid");
        assert_eq!(s.y_domain, Domain::new(-1e308, 1e308));
        let ys: Vec<f64> = s.points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn diagonal_holds_histograms() {
        let ds = dataset();
        let layout = MatrixLayout::layout(&ds.all_rows(), ds.features(), BinPolicy::default()).unwrap();
        for f in ["len", "wid"] {
            match &layout.cell(f, f).unwrap().value {
                LayoutCell::Histogram(h) => {
                    assert_eq!(h.bins.len(), 15);
                    assert_eq!(h.total(), 3);
                }
                other => panic!("expected histogram, got {other:?}"),
            }
        }
    }

    #[test]
    fn group_view_keeps_dataset_row_ids() {
        let ds = dataset();
        let a = ds.group(&GroupKey::named("a")).unwrap();
        let layout = MatrixLayout::layout(&a, ds.features(), BinPolicy::default()).unwrap();
        let rows: Vec<usize> = scatter_at(&layout, "len", "wid").points.iter().map(|p| p.row).collect();
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn brushing_selects_rows_inside_rect() {
        let ds = dataset();
        let layout = MatrixLayout::layout(&ds.all_rows(), ds.features(), BinPolicy::default()).unwrap();

        let picked = layout
            .brush("len", "wid", &BrushRect::new(0.6, 1.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(picked.into_iter().collect::<Vec<_>>(), vec![0, 1]);

        assert!(layout.brush("len", "len", &BrushRect::new(0.0, 0.0, 1.0, 1.0)).is_none());
        assert!(layout.brush("len", "nope", &BrushRect::new(0.0, 0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn empty_group_yields_empty_cells() {
        let ds = Dataset::from_rows(
            FeatureList::new(["x", "y"]).unwrap(),
            Vec::new(),
            ParseReport::default(),
        )
        .unwrap();
        let layout = MatrixLayout::layout(&ds.all_rows(), ds.features(), BinPolicy::default()).unwrap();
        assert_eq!(layout.cells.len(), 4);
        assert!(layout.cells.iter().all(|c| c.value == LayoutCell::Empty));
    }
}
