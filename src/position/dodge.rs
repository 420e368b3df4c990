use super::{resolution, Position};
use crate::data::{Column, DataTable, GROUP};
use crate::error::Result;
use crate::params::Params;
use crate::stat::rows_by_x;

/// Places the groups sharing an x side by side, splitting the element width
/// evenly among them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionDodge;

impl Position for PositionDodge {
    fn name(&self) -> &'static str {
        "dodge"
    }

    fn setup_params(&self, data: &DataTable, params: &Params) -> Result<Params> {
        if params.contains("width") {
            return Ok(params.clone());
        }
        let width = match (data.numeric("xmin"), data.numeric("xmax")) {
            (Some(lo), Some(hi)) => lo
                .iter()
                .zip(hi)
                .map(|(a, b)| b - a)
                .filter(|w| w.is_finite())
                .fold(None, |acc: Option<f64>, w| Some(acc.map_or(w, |a| a.max(w)))),
            _ => None,
        };
        let width = width.unwrap_or_else(|| 0.9 * data.numeric("x").map(resolution).unwrap_or(1.0));
        Ok(params.clone().with("width", width))
    }

    fn compute_panel(&self, data: &DataTable, params: &Params) -> Result<DataTable> {
        let xs = match data.numeric("x") {
            Some(x) => x,
            None => return Ok(data.clone()),
        };
        let width = params.get_f64("width").unwrap_or(0.9);
        let groups = data.numeric(GROUP);
        let group_of = |i: usize| groups.map(|g| g[i]).unwrap_or(1.0);
        let xmin = data.numeric("xmin");
        let xmax = data.numeric("xmax");

        let mut new_x = xs.to_vec();
        let mut new_xmin = xmin.map(<[f64]>::to_vec);
        let mut new_xmax = xmax.map(<[f64]>::to_vec);

        for (_, rows) in rows_by_x(xs) {
            let mut ids: Vec<f64> = rows.iter().map(|&i| group_of(i)).collect();
            ids.sort_by(|a, b| a.total_cmp(b));
            ids.dedup();
            let n = ids.len() as f64;
            if ids.len() < 2 {
                continue;
            }
            let d_width = match (xmin, xmax) {
                (Some(lo), Some(hi)) => rows.iter().map(|&i| hi[i] - lo[i]).fold(0.0, f64::max),
                _ => width,
            };
            for &i in &rows {
                let idx = ids.iter().position(|g| *g == group_of(i)).unwrap_or(0) as f64 + 1.0;
                let x = xs[i] + width * ((idx - 0.5) / n - 0.5);
                new_x[i] = x;
                if let Some(v) = new_xmin.as_mut() {
                    v[i] = x - d_width / n / 2.0;
                }
                if let Some(v) = new_xmax.as_mut() {
                    v[i] = x + d_width / n / 2.0;
                }
            }
        }

        let mut out = data.clone().with_column("x", Column::Numeric(new_x))?;
        if let Some(v) = new_xmin {
            out = out.with_column("xmin", Column::Numeric(v))?;
        }
        if let Some(v) = new_xmax {
            out = out.with_column("xmax", Column::Numeric(v))?;
        }
        Ok(out)
    }
}
