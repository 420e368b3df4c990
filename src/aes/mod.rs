//! Aesthetic mappings.

pub mod expr;

use crate::data::Value;
use crate::error::Result;
use indexmap::IndexMap;

pub use expr::{Expression, Variables};

/// Aesthetics that take part in position scales and coordinate transforms.
pub const X_AESTHETICS: &[&str] = &["x", "xmin", "xmax", "xend", "xintercept", "xlower", "xmiddle", "xupper"];
pub const Y_AESTHETICS: &[&str] = &[
    "y", "ymin", "ymax", "yend", "yintercept", "lower", "middle", "upper", "ymin_final", "ymax_final",
];

/// Normalise aesthetic spelling.
pub fn canonical_aes(name: &str) -> &str {
    match name {
        "colour" => "color",
        "col" => "color",
        other => other,
    }
}

/// The scale an aesthetic trains: `xmin` trains `x`, `ymax` trains `y`.
pub fn aes_family(name: &str) -> &str {
    if X_AESTHETICS.contains(&name) {
        "x"
    } else if Y_AESTHETICS.contains(&name) {
        "y"
    } else {
        name
    }
}

pub fn is_position_aes(name: &str) -> bool {
    matches!(aes_family(name), "x" | "y")
}

/// Whether `name` is an aesthetic of any geom or stat.
pub fn is_known_aes(name: &str) -> bool {
    is_position_aes(name)
        || matches!(
            name,
            "color" | "fill" | "size" | "alpha" | "shape" | "linetype" | "linewidth" | "stroke" | "label"
                | "angle" | "group" | "weight"
        )
}

/// Aesthetics that never get a scale.
pub fn is_unscaled_aes(name: &str) -> bool {
    matches!(name, "group" | "label" | "PANEL" | "weight")
}

/// One entry of an [`AestheticSpec`].
#[derive(Debug, Clone, PartialEq)]
pub enum AesValue {
    /// Evaluated against the layer data.
    Expr(Expression),
    /// Broadcast to every row, then scaled like mapped data.
    Const(Value),
}

impl AesValue {
    pub fn is_expr(&self) -> bool {
        matches!(self, AesValue::Expr(_))
    }

    /// Text used for default axis and legend titles.
    pub fn label(&self) -> String {
        match self {
            AesValue::Expr(e) => e.source().to_string(),
            AesValue::Const(v) => v.key(),
        }
    }
}

/// Ordered mapping from aesthetic name to expression or constant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AestheticSpec {
    entries: IndexMap<String, AesValue>,
}

impl AestheticSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an aesthetic to an expression given as source text.
    pub fn map(self, aes: &str, source: &str) -> Result<Self> {
        Ok(self.set(aes, AesValue::Expr(Expression::parse(source)?)))
    }

    /// Map an aesthetic to a constant.
    pub fn constant(self, aes: &str, value: Value) -> Self {
        self.set(aes, AesValue::Const(value))
    }

    pub fn set(mut self, aes: &str, value: AesValue) -> Self {
        self.entries.insert(canonical_aes(aes).to_string(), value);
        self
    }

    pub fn get(&self, aes: &str) -> Option<&AesValue> {
        self.entries.get(canonical_aes(aes))
    }

    pub fn contains(&self, aes: &str) -> bool {
        self.entries.contains_key(canonical_aes(aes))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AesValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `global ∪ layer`, layer entries winning on collision. Order is the
    /// global order followed by layer-only entries.
    pub fn merge(global: &AestheticSpec, layer: &AestheticSpec) -> AestheticSpec {
        let mut merged = global.clone();
        for (k, v) in &layer.entries {
            merged.entries.insert(k.clone(), v.clone());
        }
        merged
    }
}
