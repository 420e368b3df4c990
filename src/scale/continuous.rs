use super::breaks::{BreakPolicy, FixedBreaks, LogBreaks, PrettyBreaks};
use super::transform::Transform;
use crate::data::Value;
use crate::palette::{self, GRADIENT_HIGH, GRADIENT_LOW, NA_COLOR};
use serde::Serialize;
use std::sync::Arc;

/// Default output range of a continuous non-position aesthetic.
pub fn default_range(aes: &str) -> (f64, f64) {
    match aes {
        "alpha" => (0.1, 1.0),
        "linewidth" | "stroke" => (0.5, 3.0),
        _ => (1.0, 6.0),
    }
}

pub fn is_color_aes(aes: &str) -> bool {
    matches!(aes, "color" | "fill")
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContinuousScale {
    pub transform: Transform,
    /// Fixed domain in data units; overrides training for mapping and breaks.
    pub limits: Option<(f64, f64)>,
    /// Output range for size-like aesthetics.
    pub range: Option<(f64, f64)>,
    /// Gradient endpoints for colour aesthetics.
    pub low: Option<String>,
    pub high: Option<String>,
    #[serde(skip)]
    pub break_policy: Option<Arc<dyn BreakPolicy>>,
    trained: Option<(f64, f64)>,
}

impl ContinuousScale {
    pub fn new(transform: Transform) -> Self {
        ContinuousScale {
            transform,
            ..Default::default()
        }
    }

    /// Fold values into the observed range, ignoring values that are
    /// non-finite before or after the transform.
    pub fn train(&mut self, values: &[f64]) {
        let transform = self.transform;
        for &v in values.iter().filter(|v| v.is_finite() && transform.apply(**v).is_finite()) {
            self.trained = Some(match self.trained {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
    }

    pub fn trained_range(&self) -> Option<(f64, f64)> {
        self.trained
    }

    /// Domain in data units: limits if configured, else the trained range.
    pub fn domain(&self) -> Option<(f64, f64)> {
        self.limits.or(self.trained)
    }

    /// Domain in transformed units, ordered low to high.
    pub fn transformed_domain(&self) -> Option<(f64, f64)> {
        self.domain().map(|(lo, hi)| {
            let (a, b) = (self.transform.apply(lo), self.transform.apply(hi));
            (a.min(b), a.max(b))
        })
    }

    /// Position of `v` along the axis.
    pub fn map_position(&self, v: f64) -> f64 {
        self.transform.apply(v)
    }

    /// Relative position of `v` in the domain, 0 at the low end. Values
    /// outside the domain give `None`.
    fn rescale(&self, v: f64) -> Option<f64> {
        let (lo, hi) = self.domain()?;
        let (tl, th, tv) = (
            self.transform.apply(lo),
            self.transform.apply(hi),
            self.transform.apply(v),
        );
        if !tv.is_finite() {
            return None;
        }
        let t = if th == tl { 0.5 } else { (tv - tl) / (th - tl) };
        if !(-1e-9..=1.0 + 1e-9).contains(&t) {
            return None;
        }
        Some(t.clamp(0.0, 1.0))
    }

    /// Visual value for a non-position aesthetic.
    pub fn map_visual(&self, aes: &str, v: f64) -> Value {
        let t = self.rescale(v);
        if is_color_aes(aes) {
            let low = self
                .low
                .as_deref()
                .and_then(palette::parse_color)
                .or_else(|| palette::parse_color(GRADIENT_LOW));
            let high = self
                .high
                .as_deref()
                .and_then(palette::parse_color)
                .or_else(|| palette::parse_color(GRADIENT_HIGH));
            return match (t, low, high) {
                (Some(t), Some(low), Some(high)) => {
                    Value::Str(palette::to_hex(palette::interpolate(low, high, t)))
                }
                _ => Value::Str(NA_COLOR.to_string()),
            };
        }
        let (lo, hi) = self.range.unwrap_or_else(|| default_range(aes));
        match t {
            Some(t) => Value::Num(lo + (hi - lo) * t),
            None => Value::Num(f64::NAN),
        }
    }

    /// Break positions in data units inside `[min, max]`.
    pub fn breaks_in(&self, min: f64, max: f64) -> Vec<f64> {
        let policy: Arc<dyn BreakPolicy> = match &self.break_policy {
            Some(p) => p.clone(),
            None if self.transform == Transform::Log10 => Arc::new(LogBreaks),
            None => Arc::new(PrettyBreaks::default()),
        };
        let mut out = policy.breaks(min.min(max), min.max(max));
        out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        out
    }

    pub fn set_breaks(&mut self, breaks: Vec<f64>) {
        self.break_policy = Some(Arc::new(FixedBreaks(breaks)));
    }
}
