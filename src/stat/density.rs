use super::{numeric_column, param_error, percentile, sorted_finite, std_dev, Stat, StatContext};
use crate::data::{Column, DataTable};
use crate::error::Result;
use crate::params::Params;

/// Gaussian kernel density estimate evaluated on an even grid spanning the
/// layer's x range.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatDensity;

/// Silverman's rule of thumb for bandwidth selection
fn silverman_bandwidth(sorted: &[f64]) -> f64 {
    let n = sorted.len() as f64;
    if n < 2.0 {
        return 1.0;
    }
    let sd = std_dev(sorted);
    let iqr = percentile(sorted, 0.75) - percentile(sorted, 0.25);

    // h = 0.9 * min(sd, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { sd.min(iqr / 1.34) } else { sd };
    if !(scale > 0.0) {
        return 1.0;
    }
    0.9 * scale * n.powf(-0.2)
}

fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

impl Stat for StatDensity {
    fn name(&self) -> &'static str {
        "density"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x"]
    }

    fn default_params(&self) -> Params {
        Params::new().with("adjust", 1.0).with("n", 512.0).with("kernel", "gaussian")
    }

    fn computed_aes(&self) -> &'static [(&'static str, &'static str)] {
        &[("y", "density")]
    }

    fn setup_params(&self, _data: &DataTable, params: &Params) -> Result<Params> {
        if params.get_str("kernel").unwrap_or("gaussian") != "gaussian" {
            return Err(param_error(self.name(), "only the gaussian kernel is available"));
        }
        if !(params.get_f64("adjust").unwrap_or(1.0) > 0.0) {
            return Err(param_error(self.name(), "`adjust` must be positive"));
        }
        if let Some(bw) = params.get_f64("bw") {
            if !(bw > 0.0) {
                return Err(param_error(self.name(), "`bw` must be positive"));
            }
        }
        let n = params.get_f64("n").unwrap_or(512.0);
        if n < 2.0 || n.fract() != 0.0 {
            return Err(param_error(self.name(), "`n` must be an integer of at least 2"));
        }
        Ok(params.clone())
    }

    fn compute_group(&self, data: &DataTable, ctx: &StatContext, params: &Params) -> Result<DataTable> {
        let sorted = sorted_finite(numeric_column(data, self.name(), "x")?);
        if sorted.len() < 2 {
            return Ok(DataTable::new());
        }
        let bw = params
            .get_f64("bw")
            .unwrap_or_else(|| silverman_bandwidth(&sorted))
            * params.get_f64("adjust").unwrap_or(1.0);
        let n_grid = params.get_f64("n").unwrap_or(512.0) as usize;

        let (mut lo, mut hi) = ctx.x_range.unwrap_or((sorted[0], sorted[sorted.len() - 1]));
        if lo == hi {
            lo -= 3.0 * bw;
            hi += 3.0 * bw;
        }
        let step = (hi - lo) / (n_grid - 1) as f64;
        let nobs = sorted.len() as f64;

        let grid: Vec<f64> = (0..n_grid).map(|i| lo + i as f64 * step).collect();
        let density: Vec<f64> = grid
            .iter()
            .map(|&x| sorted.iter().map(|&xi| gaussian_kernel((x - xi) / bw)).sum::<f64>() / (nobs * bw))
            .collect();
        let max_density = density.iter().cloned().fold(0.0, f64::max);

        DataTable::from_columns(vec![
            ("x", Column::Numeric(grid)),
            (
                "scaled",
                Column::Numeric(
                    density
                        .iter()
                        .map(|d| if max_density > 0.0 { d / max_density } else { 0.0 })
                        .collect(),
                ),
            ),
            ("count", Column::Numeric(density.iter().map(|d| d * nobs).collect())),
            ("n", Column::Numeric(vec![nobs; n_grid])),
            ("density", Column::Numeric(density)),
        ])
    }
}
