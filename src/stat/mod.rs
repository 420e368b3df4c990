//! Statistical transforms.
//!
//! A stat runs once per (panel, group). The default [`Stat::compute_panel`]
//! splits a panel by group, calls [`Stat::compute_group`] and re-attaches
//! `PANEL`, `group` and every column that is constant within each group.

mod bin;
mod boxplot;
mod count;
mod density;
mod identity;
mod smooth;
mod summary;

pub use bin::StatBin;
pub use boxplot::StatBoxplot;
pub use count::StatCount;
pub use density::StatDensity;
pub use identity::StatIdentity;
pub use smooth::StatSmooth;
pub use summary::StatSummary;

use crate::data::{Column, DataTable, GROUP, PANEL};
use crate::error::{PlotError, Result};
use crate::params::Params;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Layer-wide information available to every group computation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatContext {
    /// Finite range of `x` over the whole layer.
    pub x_range: Option<(f64, f64)>,
    /// Finite range of `y` over the whole layer.
    pub y_range: Option<(f64, f64)>,
}

impl StatContext {
    pub fn from_data(data: &DataTable) -> Self {
        StatContext {
            x_range: data.numeric("x").and_then(finite_range),
            y_range: data.numeric("y").and_then(finite_range),
        }
    }
}

pub trait Stat: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn required_aes(&self) -> &'static [&'static str] {
        &[]
    }

    fn default_params(&self) -> Params {
        Params::new()
    }

    /// `(aesthetic, column)` pairs applied after the stat when the output
    /// lacks the aesthetic, e.g. `y ← count`.
    fn computed_aes(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// Validate and complete parameters. Configuration errors fail here.
    fn setup_params(&self, _data: &DataTable, params: &Params) -> Result<Params> {
        Ok(params.clone())
    }

    fn compute_panel(
        &self,
        data: &DataTable,
        carried: &[String],
        ctx: &StatContext,
        params: &Params,
    ) -> Result<DataTable> {
        let mut parts = Vec::new();
        for (_, rows) in data.split_by_id(GROUP) {
            let group = data.take(&rows);
            let computed = self.compute_group(&group, ctx, params)?;
            if computed.is_empty() {
                continue;
            }
            parts.push(reattach(computed, &group, carried)?);
        }
        DataTable::concat(&parts)
    }

    fn compute_group(&self, data: &DataTable, ctx: &StatContext, params: &Params) -> Result<DataTable>;
}

/// Broadcast identifying columns of the source group onto the stat output.
fn reattach(mut computed: DataTable, group: &DataTable, carried: &[String]) -> Result<DataTable> {
    let n = computed.nrow();
    for name in carried.iter().map(String::as_str).chain([PANEL, GROUP]) {
        if computed.has(name) {
            continue;
        }
        if let Some(col) = group.column(name) {
            computed = computed.with_column(name, col.take(&vec![0; n]))?;
        }
    }
    Ok(computed)
}

/// Columns constant within every (panel, group) of the layer.
fn constant_columns(data: &DataTable) -> Vec<String> {
    let splits: Vec<Vec<usize>> = data
        .split_by_id(PANEL)
        .into_iter()
        .flat_map(|(_, rows)| {
            let panel = data.take(&rows);
            panel
                .split_by_id(GROUP)
                .into_iter()
                .map(|(_, g)| g.iter().map(|&i| rows[i]).collect::<Vec<usize>>())
                .collect::<Vec<_>>()
        })
        .collect();
    data.columns()
        .filter(|(name, _)| *name != PANEL && *name != GROUP)
        .filter(|(_, col)| {
            splits.iter().all(|rows| {
                rows.first()
                    .map(|&first| {
                        let k = col.key(first);
                        rows.iter().all(|&i| col.key(i) == k)
                    })
                    .unwrap_or(true)
            })
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Run `stat` over a layer: required-aesthetic check, parameter setup, then
/// one `compute_panel` per panel.
pub fn run_stat(stat: &dyn Stat, data: &DataTable, params: &Params) -> Result<DataTable> {
    for aes in stat.required_aes() {
        if !data.has(aes) {
            return Err(PlotError::MissingAesthetic {
                component: format!("stat_{}", stat.name()),
                aesthetic: aes.to_string(),
            });
        }
    }
    let params = stat.setup_params(data, &params.merged_over(&stat.default_params()))?;
    if stat.name() == "identity" {
        return Ok(data.clone());
    }
    let ctx = StatContext::from_data(data);
    let carried = constant_columns(data);
    let mut panels = Vec::new();
    for (_, rows) in data.split_by_id(PANEL) {
        panels.push(stat.compute_panel(&data.take(&rows), &carried, &ctx, &params)?);
    }
    let out = DataTable::concat(&panels)?;
    debug!(stat = stat.name(), rows_in = data.nrow(), rows_out = out.nrow(), "stat computed");
    Ok(out)
}

/// Look up a stat by name.
pub fn stat_from_name(name: &str) -> Result<Arc<dyn Stat>> {
    let stat: Arc<dyn Stat> = match name {
        "identity" => Arc::new(StatIdentity),
        "count" => Arc::new(StatCount),
        "bin" => Arc::new(StatBin),
        "summary" => Arc::new(StatSummary),
        "smooth" => Arc::new(StatSmooth),
        "boxplot" => Arc::new(StatBoxplot),
        "density" => Arc::new(StatDensity),
        _ => {
            return Err(PlotError::UnknownComponent {
                kind: "stat",
                name: name.to_string(),
            })
        }
    };
    Ok(stat)
}

pub(crate) fn param_error(stat: &str, message: impl Into<String>) -> PlotError {
    PlotError::StatParameter {
        stat: stat.to_string(),
        message: message.into(),
    }
}

pub(crate) fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, &v| match acc {
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            None => Some((v, v)),
        })
}

/// Finite values of a numeric column, sorted ascending.
pub(crate) fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Linear-interpolation quantile of sorted data.
pub(crate) fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return f64::NAN;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    (values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
}

/// Distinct x values of a group with the rows holding each, ascending by x.
pub(crate) fn rows_by_x(xs: &[f64]) -> Vec<(f64, Vec<usize>)> {
    let mut order: Vec<usize> = (0..xs.len()).filter(|&i| xs[i].is_finite()).collect();
    order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));
    let mut out: Vec<(f64, Vec<usize>)> = Vec::new();
    for i in order {
        match out.last_mut() {
            Some((x, rows)) if *x == xs[i] => rows.push(i),
            _ => out.push((xs[i], vec![i])),
        }
    }
    out
}

pub(crate) fn numeric_column<'a>(data: &'a DataTable, stat: &str, aes: &str) -> Result<&'a [f64]> {
    match data.column(aes) {
        Some(Column::Numeric(v)) => Ok(v),
        Some(_) => Err(param_error(stat, format!("stat_{} requires a numeric {} aesthetic", stat, aes))),
        None => Err(PlotError::MissingAesthetic {
            component: format!("stat_{}", stat),
            aesthetic: aes.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let d = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&d, 0.5), 2.5);
        assert_eq!(percentile(&d, 0.0), 1.0);
        assert_eq!(percentile(&[7.0], 0.9), 7.0);
    }

    #[test]
    fn test_rows_by_x() {
        let groups = rows_by_x(&[2.0, 1.0, 2.0, f64::NAN]);
        assert_eq!(groups, vec![(1.0, vec![1]), (2.0, vec![0, 2])]);
    }

    #[test]
    fn test_unknown_stat() {
        assert!(matches!(
            stat_from_name("violin"),
            Err(PlotError::UnknownComponent { kind: "stat", .. })
        ));
    }

    #[test]
    fn test_required_aes_checked_before_compute() {
        let data = DataTable::from_columns(vec![("y", Column::Numeric(vec![1.0]))]).unwrap();
        let err = run_stat(&StatBin, &data, &Params::new()).unwrap_err();
        assert_eq!(
            err,
            PlotError::MissingAesthetic {
                component: "stat_bin".to_string(),
                aesthetic: "x".to_string()
            }
        );
    }

    #[test]
    fn test_constant_columns_carried() {
        let data = DataTable::from_columns(vec![
            ("x", Column::Numeric(vec![1.0, 1.0, 2.0])),
            ("fill", Column::Text(vec!["a".into(), "a".into(), "b".into()])),
            (PANEL, Column::Numeric(vec![1.0, 1.0, 1.0])),
            (GROUP, Column::Numeric(vec![1.0, 1.0, 2.0])),
        ])
        .unwrap();
        let out = run_stat(&StatCount, &data, &Params::new()).unwrap();
        assert_eq!(out.nrow(), 2);
        assert_eq!(out.column("fill").unwrap().key(1), "b");
        assert_eq!(out.numeric(GROUP).unwrap(), &[1.0, 2.0]);
    }
}
