use super::Position;
use crate::data::{Column, DataTable, GROUP};
use crate::error::Result;
use crate::params::Params;
use crate::stat::rows_by_x;

/// Stacks the `y` values of rows sharing an x on top of each other.
///
/// Rows are stacked in descending group order unless `reverse` is set.
/// Negative values grow downwards from zero on a separate stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionStack;

/// Like [`PositionStack`], with every stack rescaled to span 0 to 1.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionFill;

struct Stacked {
    ymin: Vec<f64>,
    ymax: Vec<f64>,
    y: Vec<f64>,
}

fn stack(data: &DataTable, reverse: bool, normalise: bool) -> Result<Option<Stacked>> {
    let value_col = if data.has("y") { "y" } else { "ymax" };
    let (xs, values) = match (data.numeric("x"), data.numeric(value_col)) {
        (Some(x), Some(v)) => (x, v),
        _ => return Ok(None),
    };
    let groups = data.numeric(GROUP);
    let group_of = |i: usize| groups.map(|g| g[i]).unwrap_or(1.0);

    let mut out = Stacked {
        ymin: data.numeric("ymin").map(<[f64]>::to_vec).unwrap_or_else(|| values.to_vec()),
        ymax: data.numeric("ymax").map(<[f64]>::to_vec).unwrap_or_else(|| values.to_vec()),
        y: values.to_vec(),
    };

    for (_, mut rows) in rows_by_x(xs) {
        rows.retain(|&i| values[i].is_finite());
        rows.sort_by(|&a, &b| {
            let ord = group_of(a).total_cmp(&group_of(b)).then(a.cmp(&b));
            if reverse {
                ord
            } else {
                ord.reverse()
            }
        });
        let pos_total: f64 = rows.iter().map(|&i| values[i]).filter(|v| *v > 0.0).sum();
        let neg_total: f64 = rows.iter().map(|&i| values[i]).filter(|v| *v < 0.0).sum::<f64>().abs();

        let (mut pos, mut neg) = (0.0, 0.0);
        for i in rows {
            let v = values[i];
            let (lo, hi, end) = if v >= 0.0 {
                let start = pos;
                pos += v;
                (start, pos, pos)
            } else {
                let start = neg;
                neg += v;
                (neg, start, neg)
            };
            let scale = match (normalise, v >= 0.0) {
                (false, _) => 1.0,
                (true, true) if pos_total > 0.0 => 1.0 / pos_total,
                (true, false) if neg_total > 0.0 => 1.0 / neg_total,
                (true, _) => 1.0,
            };
            out.ymin[i] = lo * scale;
            out.ymax[i] = hi * scale;
            out.y[i] = end * scale;
        }
    }
    Ok(Some(out))
}

fn apply(data: &DataTable, params: &Params, normalise: bool) -> Result<DataTable> {
    let reverse = params.get_bool("reverse").unwrap_or(false);
    match stack(data, reverse, normalise)? {
        Some(s) => data
            .clone()
            .with_column("y", Column::Numeric(s.y))?
            .with_column("ymin", Column::Numeric(s.ymin))?
            .with_column("ymax", Column::Numeric(s.ymax)),
        None => Ok(data.clone()),
    }
}

impl Position for PositionStack {
    fn name(&self) -> &'static str {
        "stack"
    }

    fn default_params(&self) -> Params {
        Params::new().with("reverse", false)
    }

    fn compute_panel(&self, data: &DataTable, params: &Params) -> Result<DataTable> {
        apply(data, params, false)
    }
}

impl Position for PositionFill {
    fn name(&self) -> &'static str {
        "fill"
    }

    fn default_params(&self) -> Params {
        Params::new().with("reverse", false)
    }

    fn compute_panel(&self, data: &DataTable, params: &Params) -> Result<DataTable> {
        apply(data, params, true)
    }
}
