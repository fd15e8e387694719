//! Axis domain helpers: extents, outward rounding, and "nice" tick steps.
//!
//! `nice` and `ticks` follow the classic tick-increment algorithm used by
//! most plotting libraries, so a renderer placing ticks on the returned
//! domains gets round boundary values.

use serde::Serialize;

/// A closed numeric interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub fn new(min: f64, max: f64) -> Self {
        Domain { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    pub fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }

    /// Map `v` into `[0, 1]` over this domain. A zero-width domain maps
    /// everything to the midpoint.
    pub fn normalize(&self, v: f64) -> f64 {
        let w = self.width();
        if w == 0.0 {
            0.5
        } else if w.is_infinite() {
            Domain::new(self.min / 2.0, self.max / 2.0).normalize(v / 2.0)
        } else {
            (v - self.min) / w
        }
    }
}

/// Minimum and maximum of `values`, ignoring `NaN`. `None` when nothing is left.
pub fn extent(values: &[f64]) -> Option<Domain> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<Domain>, v| match acc {
            None => Some(Domain::new(v, v)),
            Some(d) => Some(Domain::new(d.min.min(v), d.max.max(v))),
        })
}

/// `[floor(min), ceil(max)]`.
pub fn floor_ceil(domain: Domain) -> Domain {
    Domain::new(domain.min.floor(), domain.max.ceil())
}

/// Extend `domain` outward so both ends land on a multiple of a round tick
/// step for roughly `count` ticks.
///
/// Returns the input unchanged when it is degenerate or the step does not
/// settle within ten refinements.
pub fn nice(domain: Domain, count: usize) -> Domain {
    let (mut start, mut stop) = (domain.min, domain.max);
    if !(start < stop) || !(stop - start).is_finite() || count == 0 {
        return domain;
    }
    let count = count as f64;
    let mut prestep: Option<f64> = None;

    for _ in 0..10 {
        let step = tick_increment(start, stop, count);
        if prestep == Some(step) {
            return Domain::new(start, stop);
        } else if step > 0.0 {
            start = (start / step).floor() * step;
            stop = (stop / step).ceil() * step;
        } else if step < 0.0 {
            start = (start * step).ceil() / step;
            stop = (stop * step).floor() / step;
        } else {
            break;
        }
        prestep = Some(step);
    }
    domain
}

/// Round tick values covering `[start, stop]`, about `count` of them.
pub fn ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (lo, hi) = if reverse { (stop, start) } else { (start, stop) };
    if !(hi - lo).is_finite() {
        return Vec::new();
    }
    let TickSpec { i1, i2, inc } = tick_spec(lo, hi, count as f64);
    if !(i2 >= i1) {
        return Vec::new();
    }
    let n = (i2 - i1) as usize + 1;
    let mut out: Vec<f64> = (0..n)
        .map(|i| {
            let k = (i1 + i as i64) as f64;
            if inc < 0.0 {
                k / -inc
            } else {
                k * inc
            }
        })
        .collect();
    if reverse {
        out.reverse();
    }
    out
}

/// Signed tick step: positive is the step itself, negative is the
/// reciprocal of a sub-unit step (kept integral to avoid drift).
pub fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    tick_spec(start, stop, count).inc
}

struct TickSpec {
    i1: i64,
    i2: i64,
    inc: f64,
}

fn tick_spec(start: f64, stop: f64, count: f64) -> TickSpec {
    let e10 = 50f64.sqrt();
    let e5 = 10f64.sqrt();
    let e2 = 2f64.sqrt();

    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor() as i32;
    let error = step / 10f64.powi(power);
    let factor = if error >= e10 {
        10.0
    } else if error >= e5 {
        5.0
    } else if error >= e2 {
        2.0
    } else {
        1.0
    };

    let (i1, i2, inc) = if power < 0 {
        let pos = 10f64.powi(-power) / factor;
        let mut i1 = round_half_up(start * pos);
        let mut i2 = round_half_up(stop * pos);
        if i1 / pos < start {
            i1 += 1.0;
        }
        if i2 / pos > stop {
            i2 -= 1.0;
        }
        (i1, i2, -pos)
    } else {
        let pos = 10f64.powi(power) * factor;
        let mut i1 = round_half_up(start / pos);
        let mut i2 = round_half_up(stop / pos);
        if i1 * pos < start {
            i1 += 1.0;
        }
        if i2 * pos > stop {
            i2 -= 1.0;
        }
        (i1, i2, pos)
    };

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    TickSpec {
        i1: i1 as i64,
        i2: i2 as i64,
        inc,
    }
}

fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}
