//! Error and warning types for the plot build pipeline.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias using [`PlotError`].
pub type Result<T> = std::result::Result<T, PlotError>;

/// Fatal errors. Any of these aborts `Plot::build` with no partial output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlotError {
    /// A geom or stat requires an aesthetic that is neither mapped nor defaulted.
    #[error("{component} requires the following missing aesthetic: {aesthetic}")]
    MissingAesthetic {
        /// Geom or stat name, e.g. `geom_text`.
        component: String,
        /// Name of the missing aesthetic.
        aesthetic: String,
    },

    /// An expression references a column that is not in the data.
    #[error("unknown column '{column}' in expression '{expr}'")]
    UnknownColumn {
        /// The missing column.
        column: String,
        /// Source text of the offending expression.
        expr: String,
    },

    /// Two incompatible scale declarations, or data incompatible with a scale.
    #[error("scale conflict for aesthetic '{aesthetic}': {message}")]
    ScaleConflict {
        /// Aesthetic the scale is attached to.
        aesthetic: String,
        /// What went wrong.
        message: String,
    },

    /// A scale was asked to map before training finished. Pipeline bug.
    #[error("scale for '{aesthetic}' used before training finished")]
    ScaleNotTrained {
        /// Aesthetic of the untrained scale.
        aesthetic: String,
    },

    /// Invalid stat (or position) configuration.
    #[error("invalid parameter for stat_{stat}: {message}")]
    StatParameter {
        /// Stat name.
        stat: String,
        /// What was wrong with the parameters.
        message: String,
    },

    /// A geom/stat/position name that the registry does not know.
    #[error("unknown {kind} '{name}'")]
    UnknownComponent {
        /// `geom`, `stat` or `position`.
        kind: &'static str,
        /// Requested name.
        name: String,
    },

    /// Expression could not be parsed or evaluated.
    #[error("invalid expression '{expr}': {message}")]
    Expression {
        /// Source text.
        expr: String,
        /// Parse or type error detail.
        message: String,
    },

    /// Malformed input tables.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Non-fatal conditions collected during a build.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A discrete scale saw more levels than its palette has entries; the palette was cycled.
    PaletteOverflow {
        /// Aesthetic of the scale.
        aesthetic: String,
        /// Number of trained levels.
        levels: usize,
        /// Number of palette entries.
        palette_size: usize,
    },
    /// Rows with missing or non-finite values were dropped from a layer.
    RemovedRows {
        /// Zero-based layer index.
        layer: usize,
        /// Geom name of the layer.
        geom: String,
        /// Number of rows dropped.
        count: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::PaletteOverflow {
                aesthetic,
                levels,
                palette_size,
            } => write!(
                f,
                "scale for '{}' has {} levels but the palette only has {} values; values will be recycled",
                aesthetic, levels, palette_size
            ),
            Warning::RemovedRows { layer, geom, count } => write!(
                f,
                "removed {} rows containing missing values (layer {}, geom_{})",
                count, layer, geom
            ),
        }
    }
}
