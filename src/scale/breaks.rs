//! Break generation for continuous scales.

use crate::data::format_number;
use std::fmt;

/// Chooses break positions inside a data range (untransformed units).
pub trait BreakPolicy: fmt::Debug + Send + Sync {
    fn breaks(&self, min: f64, max: f64) -> Vec<f64>;
}

/// Round-number breaks with steps of 1, 2 or 5 times a power of ten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrettyBreaks {
    /// Approximate number of intervals.
    pub n: usize,
}

impl Default for PrettyBreaks {
    fn default() -> Self {
        PrettyBreaks { n: 5 }
    }
}

impl BreakPolicy for PrettyBreaks {
    fn breaks(&self, min: f64, max: f64) -> Vec<f64> {
        if !min.is_finite() || !max.is_finite() {
            return Vec::new();
        }
        if min == max {
            return vec![min];
        }
        let (lo, hi) = if min < max { (min, max) } else { (max, min) };
        pretty_breaks(lo, hi, self.n)
            .into_iter()
            .filter(|b| within(*b, lo, hi))
            .collect()
    }
}

/// Powers of ten inside the range; falls back to pretty breaks when the
/// range spans less than two decades.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogBreaks;

impl BreakPolicy for LogBreaks {
    fn breaks(&self, min: f64, max: f64) -> Vec<f64> {
        if !(max > 0.0) {
            return Vec::new();
        }
        let lo = if min <= 0.0 { f64::MIN_POSITIVE } else { min };
        let first = lo.log10().floor() as i32;
        let last = max.log10().ceil() as i32;
        let powers: Vec<f64> = (first..=last)
            .map(|e| 10f64.powi(e))
            .filter(|v| within(*v, lo, max))
            .collect();
        if powers.len() >= 2 {
            powers
        } else {
            PrettyBreaks::default().breaks(lo, max)
        }
    }
}

/// User-supplied break positions, kept when inside the range.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedBreaks(pub Vec<f64>);

impl BreakPolicy for FixedBreaks {
    fn breaks(&self, min: f64, max: f64) -> Vec<f64> {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.0.iter().copied().filter(|b| within(*b, lo, hi)).collect()
    }
}

fn within(v: f64, lo: f64, hi: f64) -> bool {
    let eps = (hi - lo).abs() * 1e-10;
    v >= lo - eps && v <= hi + eps
}

/// Candidate breaks covering `[min, max]` with a 1-2-5 step.
pub fn pretty_breaks(min: f64, max: f64, n: usize) -> Vec<f64> {
    if n == 0 || min >= max {
        return vec![];
    }

    let rough_step = (max - min) / (n as f64);
    let magnitude = 10f64.powf(rough_step.log10().floor());
    let residual = rough_step / magnitude;

    let step = if residual <= 1.0 {
        magnitude
    } else if residual <= 2.0 {
        2.0 * magnitude
    } else if residual <= 5.0 {
        5.0 * magnitude
    } else {
        10.0 * magnitude
    };

    let first = (min / step).floor() as i64;
    let last = (max / step).ceil() as i64;
    (first..=last).map(|k| clean(k as f64 * step)).collect()
}

/// Strip floating-point noise such as 0.30000000000000004.
fn clean(v: f64) -> f64 {
    if v == 0.0 {
        return 0.0;
    }
    let digits = 12 - v.abs().log10().ceil() as i32;
    let factor = 10f64.powi(digits.clamp(0, 15));
    (v * factor).round() / factor
}

/// Label text for a numeric break.
pub fn format_break(v: f64) -> String {
    if v != 0.0 && (v.abs() >= 1e15 || v.abs() < 1e-4) {
        return format!("{:e}", v);
    }
    format_number(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_breaks_unit_range() {
        let b = PrettyBreaks::default().breaks(0.0, 1.0);
        assert_eq!(b, vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]);
    }

    #[test]
    fn test_pretty_breaks_stay_inside() {
        let b = PrettyBreaks::default().breaks(3.2, 97.0);
        assert_eq!(b, vec![20.0, 40.0, 60.0, 80.0]);
    }

    #[test]
    fn test_pretty_breaks_degenerate() {
        assert_eq!(PrettyBreaks::default().breaks(4.0, 4.0), vec![4.0]);
        assert!(PrettyBreaks::default().breaks(f64::NAN, 1.0).is_empty());
    }

    #[test]
    fn test_log_breaks_powers_of_ten() {
        assert_eq!(LogBreaks.breaks(1.0, 1000.0), vec![1.0, 10.0, 100.0, 1000.0]);
    }

    #[test]
    fn test_log_breaks_narrow_range_falls_back() {
        let b = LogBreaks.breaks(2.0, 8.0);
        assert!(b.len() >= 2);
        assert!(b.iter().all(|v| *v >= 2.0 && *v <= 8.0));
    }

    #[test]
    fn test_fixed_breaks_filtered() {
        assert_eq!(FixedBreaks(vec![0.0, 5.0, 50.0]).breaks(1.0, 10.0), vec![5.0]);
    }

    #[test]
    fn test_format_break() {
        assert_eq!(format_break(20.0), "20");
        assert_eq!(format_break(0.25), "0.25");
        assert_eq!(format_break(1e-6), "1e-6");
    }
}
