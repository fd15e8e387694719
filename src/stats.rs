//! Numeric routines behind the matrix cells.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::scale::{self, Domain};

// ---------------------------------------------------------------------------
// Pearson correlation
// ---------------------------------------------------------------------------

/// Whether every value in `values` is identical (or there are none).
pub fn is_constant(values: &[f64]) -> bool {
    match values.split_first() {
        None => true,
        Some((first, rest)) => rest.iter().all(|v| v == first),
    }
}

/// Population Pearson correlation of two equally long vectors.
///
/// `cov(X,Y) / (σX·σY)` with `n` as divisor. The `n` cancels, so the sums of
/// centred products are used directly. Deviations are scaled into `[-1, 1]`
/// first so the sums neither overflow nor underflow at extreme magnitudes.
/// `NaN` when either vector is constant or the lengths differ; otherwise
/// clamped to `[-1, 1]`.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || is_constant(x) || is_constant(y) {
        return f64::NAN;
    }
    let dx = unit_deviations(x);
    let dy = unit_deviations(y);

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&a, &b) in dx.iter().zip(&dy) {
        sxy += a * b;
        sxx += a * a;
        syy += b * b;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Deviations from the mean, divided by the largest absolute deviation.
fn unit_deviations(values: &[f64]) -> Vec<f64> {
    let n = values.len() as f64;
    let mean = values.iter().map(|v| v / n).sum::<f64>();
    let mut dev: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let largest = dev.iter().fold(0.0f64, |m, d| m.max(d.abs()));
    if largest > 0.0 && largest.is_finite() {
        dev.iter_mut().for_each(|d| *d /= largest);
    }
    dev
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// How a histogram divides a feature's extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinPolicy {
    /// `n` equal-width bins.
    Even(NonZeroUsize),
    /// Boundaries at round tick values, about `n` of them.
    Nice(NonZeroUsize),
}

impl BinPolicy {
    pub const DEFAULT_BINS: usize = 15;
    /// Requests above this are clamped.
    pub const MAX_BINS: usize = 1000;

    /// Requested bin count, clamped to [`BinPolicy::MAX_BINS`].
    pub fn bins(self) -> usize {
        match self {
            BinPolicy::Even(n) | BinPolicy::Nice(n) => n.get().min(Self::MAX_BINS),
        }
    }
}

impl Default for BinPolicy {
    fn default() -> Self {
        BinPolicy::Even(NonZeroUsize::new(Self::DEFAULT_BINS).unwrap_or(NonZeroUsize::MIN))
    }
}

/// One histogram bin. Half-open `[lower, upper)` except the last, which is
/// closed and holds the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub domain: Domain,
    pub bins: Vec<Bin>,
}

impl Histogram {
    /// Bin `values` over their own extent. `None` for an empty input.
    pub fn build(values: &[f64], policy: BinPolicy) -> Option<Histogram> {
        let domain = scale::extent(values)?;
        let edges = edges(domain, policy);

        let mut bins: Vec<Bin> = edges
            .windows(2)
            .map(|w| Bin {
                lower: w[0],
                upper: w[1],
                count: 0,
            })
            .collect();

        // Interior edges only: a value equal to an edge belongs to the bin
        // above it, and the maximum falls into the last bin.
        let interior = &edges[1..edges.len() - 1];
        for &v in values.iter().filter(|v| !v.is_nan()) {
            let idx = interior.partition_point(|&e| e <= v);
            bins[idx].count += 1;
        }

        Some(Histogram { domain, bins })
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Largest bin count, for scaling bar heights.
    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

/// Bin edges from `domain.min` to `domain.max`, at least two of them.
fn edges(domain: Domain, policy: BinPolicy) -> Vec<f64> {
    let Domain { min, max } = domain;
    if min == max || !(max - min).is_finite() {
        return vec![min, max];
    }
    let n = policy.bins();
    match policy {
        BinPolicy::Even(_) => {
            let width = (max - min) / n as f64;
            let mut edges: Vec<f64> = (0..n).map(|i| min + width * i as f64).collect();
            edges.push(max);
            edges
        }
        BinPolicy::Nice(_) => {
            let mut edges = vec![min];
            edges.extend(
                scale::ticks(min, max, n)
                    .into_iter()
                    .filter(|&t| min < t && t < max),
            );
            edges.push(max);
            edges
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn even(n: usize) -> BinPolicy {
        BinPolicy::Even(NonZeroUsize::new(n).unwrap())
    }

    #[test]
    fn perfect_correlations() {
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]), 1.0);
        assert_eq!(pearson(&[1.0, 2.0, 3.0], &[6.0, 4.0, 2.0]), -1.0);
    }

    #[test]
    fn constant_column_is_nan() {
        assert!(pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).is_nan());
        assert!(pearson(&[0.1, 0.1, 0.1], &[0.1, 0.1, 0.1]).is_nan());
        assert!(pearson(&[1.0], &[2.0]).is_nan());
        assert!(pearson(&[], &[]).is_nan());
    }

    #[test]
    fn extreme_magnitudes_stay_finite() {
        let x = [1e80, 2e80, 3e80];
        assert_eq!(pearson(&x, &[2e80, 4e80, 6e80]), 1.0);

        let r = pearson(&[1e-170, 2e-170, 3e-170], &[1e-170, 3e-170, 2e-170]);
        assert!((r - 0.5).abs() < 1e-12, "r = {r}");

        let r = pearson(&[-1e308, 0.0, 1e308], &[1.0, 2.0, 3.0]);
        assert!((r - 1.0).abs() < 1e-12, "r = {r}");
    }

    #[test]
    fn uncorrelated_is_zero() {
        let r = pearson(&[1.0, 2.0, 3.0, 4.0], &[1.0, -1.0, -1.0, 1.0]);
        assert!(r.abs() < 1e-12, "r = {r}");
    }

    #[test]
    fn even_bins_cover_extent() {
        let h = Histogram::build(&[0.0, 1.0, 2.0, 3.0, 4.0], even(4)).unwrap();
        let bounds: Vec<(f64, f64)> = h.bins.iter().map(|b| (b.lower, b.upper)).collect();
        assert_eq!(bounds, vec![(0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (3.0, 4.0)]);
        // 4.0 is the maximum and joins 3.0 in the closed last bin.
        let counts: Vec<usize> = h.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 1, 2]);
        assert_eq!(h.total(), 5);
    }

    #[test]
    fn default_policy_is_fifteen_even_bins() {
        let values: Vec<f64> = (0..100).map(|i| i as f64 * 0.37).collect();
        let h = Histogram::build(&values, BinPolicy::default()).unwrap();
        assert_eq!(h.bins.len(), 15);
        assert_eq!(h.total(), 100);
        assert_eq!(h.bins.last().unwrap().upper, 99.0 * 0.37);
    }

    #[test]
    fn nice_bins_use_round_thresholds() {
        let values = [0.13, 0.25, 0.5, 0.51, 0.97];
        let h = Histogram::build(&values, BinPolicy::Nice(NonZeroUsize::new(5).unwrap())).unwrap();
        let lowers: Vec<f64> = h.bins.iter().map(|b| b.lower).collect();
        assert_eq!(lowers, vec![0.13, 0.2, 0.4, 0.6, 0.8]);
        assert_eq!(h.bins.last().unwrap().upper, 0.97);
        assert_eq!(h.total(), 5);
    }

    #[test]
    fn bin_count_is_clamped() {
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        let huge = NonZeroUsize::new(usize::MAX).unwrap();

        assert_eq!(BinPolicy::Even(huge).bins(), BinPolicy::MAX_BINS);
        let h = Histogram::build(&values, BinPolicy::Even(huge)).unwrap();
        assert_eq!(h.bins.len(), BinPolicy::MAX_BINS);
        assert_eq!(h.total(), 10);

        let h = Histogram::build(&values, BinPolicy::Nice(huge)).unwrap();
        assert!(h.bins.len() <= 2 * BinPolicy::MAX_BINS);
        assert_eq!(h.total(), 10);
    }

    #[test]
    fn extent_wider_than_f64_is_one_bin() {
        let h = Histogram::build(&[-1e308, 0.0, 1e308], even(15)).unwrap();
        assert_eq!(h.bins.len(), 1);
        assert_eq!(h.total(), 3);
    }

    #[test]
    fn zero_width_extent_is_one_bin() {
        let h = Histogram::build(&[2.0, 2.0, 2.0], even(15)).unwrap();
        assert_eq!(h.bins.len(), 1);
        assert_eq!(h.bins[0].count, 3);
    }

    #[test]
    fn empty_input_has_no_histogram() {
        assert!(Histogram::build(&[], even(3)).is_none());
    }

    #[test]
    fn bin_policy_deserializes() {
        let p: BinPolicy = serde_json::from_str(r#"{"even": 20}"#).unwrap();
        assert_eq!(p, even(20));
        assert!(serde_json::from_str::<BinPolicy>(r#"{"even": 0}"#).is_err());
    }
}
