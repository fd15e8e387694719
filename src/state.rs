use serde::Serialize;

use crate::data::model::{Dataset, FeatureList, GroupKey};
use crate::error::{MatrixError, UnknownGroupError};
use crate::matrix::{CorrelationMatrix, MatrixLayout};
use crate::stats::BinPolicy;

// ---------------------------------------------------------------------------
// Snapshot – one complete rebuild result
// ---------------------------------------------------------------------------

/// Which grid the selector produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Correlation,
    Layout(BinPolicy),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MatrixCells {
    Correlation(CorrelationMatrix),
    Layout(MatrixLayout),
    /// Nothing built: no group selected yet, or the selection failed.
    None,
}

impl MatrixCells {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            MatrixCells::Correlation(m) => m.cells.len(),
            MatrixCells::Layout(m) => m.cells.len(),
            MatrixCells::None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// Waiting for the first selection.
    Idle,
    Ready,
    UnknownGroup { requested: String },
    Failed { reason: String },
}

/// The matrix for the active group and feature order, plus what a renderer
/// needs to annotate it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixSnapshot {
    pub group: Option<GroupKey>,
    pub group_rows: usize,
    pub features: Vec<String>,
    /// Bumped on every rebuild; a consumer keeps only the highest it has seen.
    pub generation: u64,
    pub status: SnapshotStatus,
    pub cells: MatrixCells,
}

// ---------------------------------------------------------------------------
// MatrixSelector
// ---------------------------------------------------------------------------

/// Holds the active group, feature order and view mode, and rebuilds the
/// whole matrix whenever any of them changes.
///
/// Rebuilds are synchronous and take `&mut self`, so a newer request can
/// never be overwritten by an older one.
#[derive(Debug)]
pub struct MatrixSelector {
    dataset: Dataset,
    features: FeatureList,
    mode: ViewMode,
    active: Option<GroupKey>,
    generation: u64,
    snapshot: MatrixSnapshot,
}

impl MatrixSelector {
    /// Start idle over `dataset`, using its own feature order.
    pub fn new(dataset: Dataset, mode: ViewMode) -> Self {
        let features = dataset.features().clone();
        let snapshot = MatrixSnapshot {
            group: None,
            group_rows: 0,
            features: features.as_slice().to_vec(),
            generation: 0,
            status: SnapshotStatus::Idle,
            cells: MatrixCells::None,
        };
        MatrixSelector {
            dataset,
            features,
            mode,
            active: None,
            generation: 0,
            snapshot,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn features(&self) -> &FeatureList {
        &self.features
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn active_group(&self) -> Option<&GroupKey> {
        self.active.as_ref()
    }

    /// The most recent rebuild result.
    pub fn snapshot(&self) -> &MatrixSnapshot {
        &self.snapshot
    }

    /// Labels of every selectable group.
    pub fn group_labels(&self) -> Vec<String> {
        self.dataset.group_keys().map(GroupKey::to_string).collect()
    }

    /// Switch to the group labelled `label` and rebuild.
    ///
    /// An unknown label leaves an empty snapshot with
    /// [`SnapshotStatus::UnknownGroup`] in place and returns the error.
    pub fn select_group(&mut self, label: &str) -> Result<&MatrixSnapshot, UnknownGroupError> {
        match self.dataset.find_group(label).cloned() {
            Some(key) => {
                self.active = Some(key);
                self.rebuild();
                Ok(&self.snapshot)
            }
            None => {
                let err = UnknownGroupError {
                    requested: label.to_string(),
                    available: self.group_labels(),
                };
                log::warn!("{err}");
                self.active = None;
                self.generation += 1;
                self.snapshot = MatrixSnapshot {
                    group: None,
                    group_rows: 0,
                    features: self.features.as_slice().to_vec(),
                    generation: self.generation,
                    status: SnapshotStatus::UnknownGroup {
                        requested: label.to_string(),
                    },
                    cells: MatrixCells::None,
                };
                Err(err)
            }
        }
    }

    /// Reorder (or subset) the features and rebuild the active group.
    pub fn set_features(&mut self, features: FeatureList) -> Result<&MatrixSnapshot, MatrixError> {
        if let Some(missing) = features
            .iter()
            .find(|f| self.dataset.features().position(f).is_none())
        {
            return Err(MatrixError::UnknownFeature(missing.to_string()));
        }
        self.features = features;
        if self.active.is_some() {
            self.rebuild();
        } else {
            self.snapshot.features = self.features.as_slice().to_vec();
        }
        Ok(&self.snapshot)
    }

    /// Switch between correlation and scatter views and rebuild.
    pub fn set_mode(&mut self, mode: ViewMode) -> &MatrixSnapshot {
        self.mode = mode;
        if self.active.is_some() {
            self.rebuild();
        }
        &self.snapshot
    }

    fn rebuild(&mut self) {
        let Some(key) = self.active.clone() else {
            return;
        };
        let Some(rows) = self.dataset.group(&key) else {
            return;
        };
        let cells = match self.mode {
            ViewMode::Correlation => CorrelationMatrix::build(&rows, &self.features)
                .map(MatrixCells::Correlation),
            ViewMode::Layout(policy) => MatrixLayout::layout(&rows, &self.features, policy)
                .map(MatrixCells::Layout),
        };
        let (cells, status) = match cells {
            Ok(cells) => (cells, SnapshotStatus::Ready),
            Err(e) => {
                log::error!("Rebuild of group '{key}' failed: {e}");
                (
                    MatrixCells::None,
                    SnapshotStatus::Failed {
                        reason: e.to_string(),
                    },
                )
            }
        };

        self.generation += 1;
        log::debug!(
            "Rebuilt {:?} matrix for '{key}' ({} rows, {} features, generation {})",
            self.mode,
            rows.len(),
            self.features.len(),
            self.generation
        );
        self.snapshot = MatrixSnapshot {
            group_rows: rows.len(),
            group: Some(key),
            features: self.features.as_slice().to_vec(),
            generation: self.generation,
            status,
            cells,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{ParseReport, Row};

    fn selector(mode: ViewMode) -> MatrixSelector {
        let features = FeatureList::new(["a", "b"]).unwrap();
        let rows = vec![
            Row::new(GroupKey::named("male"), vec![1.0, 2.0]),
            Row::new(GroupKey::named("male"), vec![2.0, 4.0]),
            Row::new(GroupKey::named("male"), vec![3.0, 6.0]),
            Row::new(GroupKey::named("female"), vec![1.0, 6.0]),
            Row::new(GroupKey::named("female"), vec![2.0, 4.0]),
        ];
        let ds = Dataset::from_rows(features, rows, ParseReport::default()).unwrap();
        MatrixSelector::new(ds, mode)
    }

    #[test]
    fn starts_idle_and_empty() {
        let s = selector(ViewMode::Correlation);
        assert_eq!(s.snapshot().status, SnapshotStatus::Idle);
        assert!(s.snapshot().cells.is_empty());
        assert_eq!(s.snapshot().generation, 0);
    }

    #[test]
    fn selecting_a_group_rebuilds() {
        let mut s = selector(ViewMode::Correlation);
        let snap = s.select_group("male").unwrap();
        assert_eq!(snap.status, SnapshotStatus::Ready);
        assert_eq!(snap.group_rows, 3);
        assert_eq!(snap.cells.len(), 4);
        assert_eq!(snap.generation, 1);

        let snap = s.select_group("female").unwrap();
        assert_eq!(snap.group, Some(GroupKey::named("female")));
        assert_eq!(snap.generation, 2);
        match &snap.cells {
            MatrixCells::Correlation(m) => assert_eq!(m.coefficient("a", "b"), Some(-1.0)),
            other => panic!("unexpected cells {other:?}"),
        }
    }

    #[test]
    fn unknown_group_yields_empty_snapshot() {
        let mut s = selector(ViewMode::Correlation);
        s.select_group("male").unwrap();

        let err = s.select_group("infant").unwrap_err();
        assert_eq!(err.requested, "infant");
        assert_eq!(err.available, vec!["female", "male"]);

        let snap = s.snapshot();
        assert!(snap.cells.is_empty());
        assert_eq!(
            snap.status,
            SnapshotStatus::UnknownGroup { requested: "infant".into() }
        );
        assert_eq!(snap.generation, 2);
        assert!(s.active_group().is_none());
    }

    #[test]
    fn reordering_features_rebuilds_active_group() {
        let mut s = selector(ViewMode::Correlation);
        s.select_group("male").unwrap();
        let snap = s.set_features(FeatureList::new(["b", "a"]).unwrap()).unwrap();
        assert_eq!(snap.features, vec!["b", "a"]);
        match &snap.cells {
            MatrixCells::Correlation(m) => assert_eq!(m.cells[0].row_feature, "b"),
            other => panic!("unexpected cells {other:?}"),
        }

        let err = s.set_features(FeatureList::new(["a", "q"]).unwrap()).unwrap_err();
        assert_eq!(err, MatrixError::UnknownFeature("q".into()));
        assert_eq!(s.features().as_slice(), ["b", "a"]);
    }

    #[test]
    fn switching_mode_keeps_group() {
        let mut s = selector(ViewMode::Correlation);
        s.select_group("female").unwrap();
        let snap = s.set_mode(ViewMode::Layout(BinPolicy::default()));
        assert!(matches!(snap.cells, MatrixCells::Layout(_)));
        assert_eq!(snap.group, Some(GroupKey::named("female")));
    }

    #[test]
    fn rebuild_is_deterministic() {
        let mut s = selector(ViewMode::Layout(BinPolicy::default()));
        let first = s.select_group("male").unwrap().cells.clone();
        let second = s.select_group("male").unwrap().cells.clone();
        assert_eq!(first, second);
    }
}
