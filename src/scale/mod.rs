//! Scales: trained mappings from data values to visual values.
//!
//! A scale moves through `Untrained → Training → Trained → Mapped`. Every
//! layer's data is folded in with [`Scale::train`], then
//! [`Scale::finish_training`] fixes the domain. Mapping before that point is
//! an error.

pub mod breaks;
pub mod continuous;
pub mod discrete;
pub mod transform;

use crate::aes::{aes_family, is_position_aes, is_unscaled_aes};
use crate::data::{Column, Value};
use crate::error::{PlotError, Result, Warning};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

pub use breaks::{BreakPolicy, FixedBreaks, LogBreaks, PrettyBreaks};
pub use continuous::ContinuousScale;
pub use discrete::DiscreteScale;
pub use transform::Transform;

/// Aesthetics that receive a default scale when mapped.
pub const SCALED_AESTHETICS: &[&str] = &[
    "x", "y", "color", "fill", "size", "alpha", "shape", "linetype", "linewidth", "stroke",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleState {
    Untrained,
    Training,
    Trained,
    Mapped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScaleKind {
    Continuous(ContinuousScale),
    Discrete(DiscreteScale),
    Identity,
}

/// One (value, label) pair of a scale's guide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Break {
    /// Domain value (level name or number in data units).
    pub value: Value,
    /// Visual value: axis position for position scales, colour/size/... otherwise.
    pub mapped: Value,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Scale {
    aesthetic: String,
    /// Guide title; falls back to the mapping's source text.
    pub name: Option<String>,
    /// Whether a legend may be drawn for this scale.
    pub guide: bool,
    kind: ScaleKind,
    state: ScaleState,
}

impl Scale {
    fn with_kind(aesthetic: &str, kind: ScaleKind) -> Self {
        let aesthetic = aes_family(crate::aes::canonical_aes(aesthetic)).to_string();
        let guide = !matches!(kind, ScaleKind::Identity);
        Scale {
            aesthetic,
            name: None,
            guide,
            kind,
            state: ScaleState::Untrained,
        }
    }

    pub fn continuous(aesthetic: &str) -> Self {
        Self::with_kind(aesthetic, ScaleKind::Continuous(ContinuousScale::default()))
    }

    pub fn discrete(aesthetic: &str) -> Self {
        Self::with_kind(aesthetic, ScaleKind::Discrete(DiscreteScale::default()))
    }

    pub fn identity(aesthetic: &str) -> Self {
        Self::with_kind(aesthetic, ScaleKind::Identity)
    }

    /// Default scale for a mapped column: discrete data gets a discrete scale,
    /// numbers a continuous one.
    pub fn default_for(aesthetic: &str, col: &Column) -> Result<Self> {
        if col.is_discrete() {
            return Ok(Self::discrete(aesthetic));
        }
        if matches!(aesthetic, "shape" | "linetype") {
            return Err(PlotError::ScaleConflict {
                aesthetic: aesthetic.to_string(),
                message: "a continuous variable cannot be mapped to this aesthetic".to_string(),
            });
        }
        Ok(Self::continuous(aesthetic))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        if let ScaleKind::Continuous(c) = &mut self.kind {
            c.transform = transform;
        }
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_limits(mut self, lo: f64, hi: f64) -> Self {
        if let ScaleKind::Continuous(c) = &mut self.kind {
            c.limits = Some((lo, hi));
        }
        self
    }

    pub fn with_levels(mut self, levels: Vec<String>) -> Self {
        if let ScaleKind::Discrete(d) = &mut self.kind {
            d.limits = Some(levels);
        }
        self
    }

    /// Manual palette for a discrete scale.
    pub fn with_values(mut self, values: Vec<String>) -> Self {
        if let ScaleKind::Discrete(d) = &mut self.kind {
            d.values = Some(values);
        }
        self
    }

    pub fn with_range(mut self, lo: f64, hi: f64) -> Self {
        if let ScaleKind::Continuous(c) = &mut self.kind {
            c.range = Some((lo, hi));
        }
        self
    }

    pub fn with_gradient(mut self, low: &str, high: &str) -> Self {
        if let ScaleKind::Continuous(c) = &mut self.kind {
            c.low = Some(low.to_string());
            c.high = Some(high.to_string());
        }
        self
    }

    pub fn with_breaks(mut self, breaks: Vec<f64>) -> Self {
        if let ScaleKind::Continuous(c) = &mut self.kind {
            c.set_breaks(breaks);
        }
        self
    }

    pub fn with_break_policy(mut self, policy: Arc<dyn BreakPolicy>) -> Self {
        if let ScaleKind::Continuous(c) = &mut self.kind {
            c.break_policy = Some(policy);
        }
        self
    }

    pub fn without_guide(mut self) -> Self {
        self.guide = false;
        self
    }

    pub fn aesthetic(&self) -> &str {
        &self.aesthetic
    }

    pub fn kind(&self) -> &ScaleKind {
        &self.kind
    }

    pub fn state(&self) -> ScaleState {
        self.state
    }

    pub fn is_position(&self) -> bool {
        is_position_aes(&self.aesthetic)
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self.kind, ScaleKind::Discrete(_))
    }

    pub fn transform(&self) -> Transform {
        match &self.kind {
            ScaleKind::Continuous(c) => c.transform,
            _ => Transform::Identity,
        }
    }

    fn conflict(&self, message: &str) -> PlotError {
        PlotError::ScaleConflict {
            aesthetic: self.aesthetic.clone(),
            message: message.to_string(),
        }
    }

    /// Fold one column into the training state.
    pub fn train(&mut self, col: &Column) -> Result<()> {
        if matches!(self.state, ScaleState::Trained | ScaleState::Mapped) {
            return Err(self.conflict("scale trained after training finished"));
        }
        if matches!(self.kind, ScaleKind::Continuous(_)) && col.is_discrete() {
            return Err(self.conflict("discrete values supplied to a continuous scale"));
        }
        let is_position = self.is_position();
        match &mut self.kind {
            ScaleKind::Continuous(c) => {
                if let Some(values) = col.as_numeric() {
                    c.train(values);
                }
            }
            ScaleKind::Discrete(d) => match col.as_numeric() {
                Some(values) if is_position => d.train_continuous(values),
                _ => d.train_levels(col),
            },
            ScaleKind::Identity => {}
        }
        self.state = ScaleState::Training;
        Ok(())
    }

    /// Close training. Returns a warning when a discrete palette must cycle.
    pub fn finish_training(&mut self) -> Option<Warning> {
        if matches!(self.state, ScaleState::Trained | ScaleState::Mapped) {
            return None;
        }
        self.state = ScaleState::Trained;
        debug!(aesthetic = %self.aesthetic, "scale trained");
        match &self.kind {
            ScaleKind::Discrete(d) if !self.is_position() => {
                d.overflow(&self.aesthetic)
                    .map(|(levels, palette_size)| Warning::PaletteOverflow {
                        aesthetic: self.aesthetic.clone(),
                        levels,
                        palette_size,
                    })
            }
            _ => None,
        }
    }

    fn ensure_trained(&self) -> Result<()> {
        match self.state {
            ScaleState::Trained | ScaleState::Mapped => Ok(()),
            _ => Err(PlotError::ScaleNotTrained {
                aesthetic: self.aesthetic.clone(),
            }),
        }
    }

    /// Map one domain value. Requires a trained scale.
    pub fn map_value(&self, value: &Value) -> Result<Value> {
        self.ensure_trained()?;
        Ok(self.map_unchecked(value))
    }

    fn map_unchecked(&self, value: &Value) -> Value {
        match &self.kind {
            ScaleKind::Identity => value.clone(),
            ScaleKind::Continuous(c) => {
                let v = value.as_f64().unwrap_or(f64::NAN);
                if self.is_position() {
                    Value::Num(c.map_position(v))
                } else {
                    c.map_visual(&self.aesthetic, v)
                }
            }
            ScaleKind::Discrete(d) => {
                if self.is_position() {
                    match value {
                        Value::Num(v) => Value::Num(*v),
                        Value::Str(s) => Value::Num(d.rank(s).map(|r| (r + 1) as f64).unwrap_or(f64::NAN)),
                    }
                } else {
                    d.map_visual(&self.aesthetic, &value.key())
                }
            }
        }
    }

    /// Map a whole column, moving the scale to `Mapped`.
    pub fn map_column(&mut self, col: &Column) -> Result<Column> {
        self.ensure_trained()?;
        if let ScaleKind::Continuous(_) = self.kind {
            if col.is_discrete() {
                return Err(self.conflict("discrete values supplied to a continuous scale"));
            }
        }
        self.state = ScaleState::Mapped;
        if matches!(self.kind, ScaleKind::Identity) {
            return Ok(col.clone());
        }
        if let (true, Some(values)) = (self.is_position(), col.as_numeric()) {
            return Ok(Column::Numeric(match &self.kind {
                ScaleKind::Continuous(c) => values.iter().map(|v| c.map_position(*v)).collect(),
                _ => values.to_vec(),
            }));
        }
        let mapped: Vec<Value> = (0..col.len()).map(|i| self.map_unchecked(&col.get(i))).collect();
        Ok(values_to_column(mapped))
    }

    /// Discrete position encoding used before stats run.
    pub fn encode_position(&self, col: &Column) -> Column {
        match &self.kind {
            ScaleKind::Discrete(d) => d.encode_position(col),
            _ => col.clone(),
        }
    }

    /// Guide breaks over the trained domain.
    pub fn breaks(&self) -> Result<Vec<Break>> {
        self.ensure_trained()?;
        Ok(match &self.kind {
            ScaleKind::Identity => Vec::new(),
            ScaleKind::Continuous(c) => match c.domain() {
                Some((lo, hi)) => self.numeric_breaks(c, lo, hi),
                None => Vec::new(),
            },
            ScaleKind::Discrete(d) => d
                .levels()
                .iter()
                .map(|level| {
                    let value = Value::Str(level.clone());
                    Break {
                        mapped: self.map_unchecked(&value),
                        value,
                        label: level.clone(),
                    }
                })
                .collect(),
        })
    }

    /// Axis breaks for a panel range given in mapped (transformed) units.
    pub fn axis_breaks(&self, range: (f64, f64)) -> Vec<Break> {
        match &self.kind {
            ScaleKind::Continuous(c) => {
                let (a, b) = (c.transform.inverse(range.0), c.transform.inverse(range.1));
                self.numeric_breaks(c, a.min(b), a.max(b))
            }
            ScaleKind::Discrete(d) => d
                .levels()
                .iter()
                .enumerate()
                .map(|(i, level)| Break {
                    value: Value::Str(level.clone()),
                    mapped: Value::Num((i + 1) as f64),
                    label: level.clone(),
                })
                .filter(|b| {
                    let p = b.mapped.as_f64().unwrap_or(f64::NAN);
                    p >= range.0.min(range.1) && p <= range.0.max(range.1)
                })
                .collect(),
            ScaleKind::Identity => PrettyBreaks::default()
                .breaks(range.0, range.1)
                .into_iter()
                .map(|v| Break {
                    value: Value::Num(v),
                    mapped: Value::Num(v),
                    label: breaks::format_break(v),
                })
                .collect(),
        }
    }

    fn numeric_breaks(&self, c: &ContinuousScale, lo: f64, hi: f64) -> Vec<Break> {
        c.breaks_in(lo, hi)
            .into_iter()
            .map(|v| Break {
                value: Value::Num(v),
                mapped: self.map_unchecked(&Value::Num(v)),
                label: breaks::format_break(v),
            })
            .collect()
    }

    /// Axis range contribution in mapped units, from limits or training.
    pub fn position_limits(&self) -> Option<(f64, f64)> {
        match &self.kind {
            ScaleKind::Continuous(c) => c.limits.map(|(lo, hi)| {
                let (a, b) = (c.transform.apply(lo), c.transform.apply(hi));
                (a.min(b), a.max(b))
            }),
            ScaleKind::Discrete(d) if !d.levels().is_empty() => {
                let n = d.levels().len() as f64;
                Some(match d.continuous_range() {
                    Some((lo, hi)) => (lo.min(1.0), hi.max(n)),
                    None => (1.0, n),
                })
            }
            _ => None,
        }
    }
}

fn values_to_column(values: Vec<Value>) -> Column {
    if values.iter().all(|v| matches!(v, Value::Num(_))) {
        Column::Numeric(values.iter().filter_map(Value::as_f64).collect())
    } else {
        Column::Text(values.iter().map(Value::key).collect())
    }
}

/// The scales of one plot, keyed by aesthetic in declaration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScaleSet {
    scales: IndexMap<String, Scale>,
}

impl ScaleSet {
    /// Register declared scales; two declarations for one aesthetic conflict.
    pub fn from_declared(declared: &[Scale]) -> Result<ScaleSet> {
        let mut set = ScaleSet::default();
        for scale in declared {
            if set.scales.contains_key(scale.aesthetic()) {
                return Err(PlotError::ScaleConflict {
                    aesthetic: scale.aesthetic().to_string(),
                    message: "a scale for this aesthetic is already declared".to_string(),
                });
            }
            set.scales.insert(scale.aesthetic().to_string(), scale.clone());
        }
        Ok(set)
    }

    pub fn get(&self, aes: &str) -> Option<&Scale> {
        self.scales.get(aes_family(aes))
    }

    pub fn get_mut(&mut self, aes: &str) -> Option<&mut Scale> {
        self.scales.get_mut(aes_family(aes))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scale> {
        self.scales.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Scale> {
        self.scales.values_mut()
    }

    /// Add a default scale for a mapped column when none exists yet.
    pub fn ensure_default(&mut self, aes: &str, col: &Column) -> Result<()> {
        let family = aes_family(aes);
        if is_unscaled_aes(family) || !SCALED_AESTHETICS.contains(&family) {
            return Ok(());
        }
        if !self.scales.contains_key(family) {
            let scale = Scale::default_for(family, col)?;
            debug!(aesthetic = family, discrete = scale.is_discrete(), "added default scale");
            self.scales.insert(family.to_string(), scale);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(v: &[f64]) -> Column {
        Column::Numeric(v.to_vec())
    }

    #[test]
    fn test_map_before_training_fails() {
        let mut s = Scale::continuous("x");
        s.train(&nums(&[1.0, 2.0])).unwrap();
        let err = s.map_column(&nums(&[1.0])).unwrap_err();
        assert_eq!(err, PlotError::ScaleNotTrained { aesthetic: "x".to_string() });
    }

    #[test]
    fn test_state_machine() {
        let mut s = Scale::continuous("size");
        assert_eq!(s.state(), ScaleState::Untrained);
        s.train(&nums(&[1.0])).unwrap();
        assert_eq!(s.state(), ScaleState::Training);
        assert!(s.finish_training().is_none());
        assert_eq!(s.state(), ScaleState::Trained);
        s.map_column(&nums(&[1.0])).unwrap();
        assert_eq!(s.state(), ScaleState::Mapped);
        assert!(s.train(&nums(&[2.0])).is_err());
    }

    #[test]
    fn test_discrete_into_continuous_conflicts() {
        let mut s = Scale::continuous("x");
        let err = s.train(&Column::Text(vec!["a".into()])).unwrap_err();
        assert!(matches!(err, PlotError::ScaleConflict { .. }));
    }

    #[test]
    fn test_numeric_into_discrete_color_is_levels() {
        let mut s = Scale::discrete("color");
        s.train(&nums(&[2.0, 1.0])).unwrap();
        s.finish_training();
        let mapped = s.map_column(&nums(&[1.0])).unwrap();
        assert_eq!(mapped, Column::Text(vec!["#FF7F0E".into()]));
    }

    #[test]
    fn test_reverse_mapping_is_decreasing() {
        let mut s = Scale::continuous("y").with_transform(Transform::Reverse);
        s.train(&nums(&[1.0, 5.0])).unwrap();
        s.finish_training();
        let mapped = s.map_column(&nums(&[1.0, 2.0, 5.0])).unwrap();
        let v = mapped.as_numeric().unwrap();
        assert!(v.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_palette_overflow_warning() {
        let mut s = Scale::discrete("color").with_values(vec!["a".into(), "b".into()]);
        s.train(&Column::Text(vec!["1".into(), "2".into(), "3".into()])).unwrap();
        let warning = s.finish_training().unwrap();
        assert_eq!(
            warning,
            Warning::PaletteOverflow {
                aesthetic: "color".to_string(),
                levels: 3,
                palette_size: 2
            }
        );
        // Second call is a no-op
        assert!(s.finish_training().is_none());
    }

    #[test]
    fn test_discrete_breaks_follow_levels() {
        let mut s = Scale::discrete("shape");
        s.train(&Column::Text(vec!["b".into(), "a".into()])).unwrap();
        s.finish_training();
        let labels: Vec<String> = s.breaks().unwrap().into_iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["b", "a"]);
    }

    #[test]
    fn test_duplicate_declaration_conflicts() {
        let res = ScaleSet::from_declared(&[Scale::continuous("x"), Scale::discrete("x")]);
        assert!(matches!(res, Err(PlotError::ScaleConflict { .. })));
    }

    #[test]
    fn test_defaults_skip_unscaled() {
        let mut set = ScaleSet::default();
        set.ensure_default("label", &Column::Text(vec!["a".into()])).unwrap();
        set.ensure_default("count", &nums(&[1.0])).unwrap();
        set.ensure_default("xmin", &nums(&[1.0])).unwrap();
        assert!(set.get("label").is_none());
        assert!(set.get("count").is_none());
        assert!(set.get("x").is_some());
    }

    #[test]
    fn test_shape_needs_discrete_data() {
        assert!(Scale::default_for("shape", &nums(&[1.0])).is_err());
    }

    #[test]
    fn test_axis_breaks_log10() {
        let mut s = Scale::continuous("x").with_transform(Transform::Log10);
        s.train(&nums(&[1.0, 1000.0])).unwrap();
        s.finish_training();
        let b = s.axis_breaks((0.0, 3.0));
        let positions: Vec<f64> = b.iter().filter_map(|b| b.mapped.as_f64()).collect();
        assert_eq!(positions.len(), 4);
        for (p, expected) in positions.iter().zip([0.0, 1.0, 2.0, 3.0]) {
            assert!((p - expected).abs() < 1e-9);
        }
        assert_eq!(b[3].label, "1000");
    }
}
