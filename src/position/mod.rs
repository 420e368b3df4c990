//! Position adjustments.
//!
//! A position runs once per panel after the stat. It keeps row count and row
//! order and only rewrites positional columns.

mod dodge;
mod identity;
mod jitter;
mod nudge;
mod stack;

pub use dodge::PositionDodge;
pub use identity::PositionIdentity;
pub use jitter::PositionJitter;
pub use nudge::PositionNudge;
pub use stack::{PositionFill, PositionStack};

use crate::data::{Column, DataTable, PANEL};
use crate::error::{PlotError, Result};
use crate::params::Params;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub trait Position: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn default_params(&self) -> Params {
        Params::new()
    }

    /// Complete parameters from the whole layer, e.g. data resolution.
    fn setup_params(&self, _data: &DataTable, params: &Params) -> Result<Params> {
        Ok(params.clone())
    }

    fn compute_panel(&self, data: &DataTable, params: &Params) -> Result<DataTable>;
}

/// Run `position` over every panel of a layer, keeping the original row order.
pub fn run_position(position: &dyn Position, data: &DataTable, params: &Params) -> Result<DataTable> {
    if position.name() == "identity" || data.is_empty() {
        return Ok(data.clone());
    }
    let params = position.setup_params(data, &params.merged_over(&position.default_params()))?;

    let mut order = Vec::with_capacity(data.nrow());
    let mut parts = Vec::new();
    for (_, rows) in data.split_by_id(PANEL) {
        let adjusted = position.compute_panel(&data.take(&rows), &params)?;
        if adjusted.nrow() != rows.len() {
            return Err(PlotError::InvalidData(format!(
                "position_{} changed the row count from {} to {}",
                position.name(),
                rows.len(),
                adjusted.nrow()
            )));
        }
        order.extend(rows);
        parts.push(adjusted);
    }
    let stacked = DataTable::concat(&parts)?;
    let mut inverse = vec![0; order.len()];
    for (k, &row) in order.iter().enumerate() {
        inverse[row] = k;
    }
    debug!(position = position.name(), rows = data.nrow(), "position adjusted");
    Ok(stacked.take(&inverse))
}

/// Look up a position by name.
pub fn position_from_name(name: &str) -> Result<Arc<dyn Position>> {
    let position: Arc<dyn Position> = match name {
        "identity" => Arc::new(PositionIdentity),
        "stack" => Arc::new(PositionStack),
        "fill" => Arc::new(PositionFill),
        "dodge" => Arc::new(PositionDodge),
        "jitter" => Arc::new(PositionJitter),
        "nudge" => Arc::new(PositionNudge),
        _ => {
            return Err(PlotError::UnknownComponent {
                kind: "position",
                name: name.to_string(),
            })
        }
    };
    Ok(position)
}

/// Smallest non-zero gap between distinct finite values, or 1.
pub(crate) fn resolution(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| *d > 0.0)
        .fold(None, |acc: Option<f64>, d| Some(acc.map_or(d, |a| a.min(d))))
        .unwrap_or(1.0)
}

/// Replace a numeric column by applying `f` row-wise, leaving absent columns alone.
pub(crate) fn map_numeric<F>(data: DataTable, name: &str, mut f: F) -> Result<DataTable>
where
    F: FnMut(usize, f64) -> f64,
{
    match data.numeric(name) {
        Some(values) => {
            let mapped: Vec<f64> = values.iter().enumerate().map(|(i, v)| f(i, *v)).collect();
            data.with_column(name, Column::Numeric(mapped))
        }
        None => Ok(data),
    }
}
