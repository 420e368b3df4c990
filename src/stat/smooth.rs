use super::{numeric_column, param_error, Stat, StatContext};
use crate::data::{Column, DataTable};
use crate::error::Result;
use crate::params::Params;

/// Least-squares line with a confidence band.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatSmooth;

impl Stat for StatSmooth {
    fn name(&self) -> &'static str {
        "smooth"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x", "y"]
    }

    fn default_params(&self) -> Params {
        Params::new()
            .with("method", "lm")
            .with("se", true)
            .with("n", 80.0)
            .with("level", 0.95)
    }

    fn setup_params(&self, _data: &DataTable, params: &Params) -> Result<Params> {
        match params.get_str("method") {
            Some("lm") | None => {}
            Some(other) => {
                return Err(param_error(self.name(), format!("unsupported method '{}', only 'lm' is available", other)))
            }
        }
        let level = params.get_f64("level").unwrap_or(0.95);
        if !(level > 0.0 && level < 1.0) {
            return Err(param_error(self.name(), "`level` must lie strictly between 0 and 1"));
        }
        let n = params.get_f64("n").unwrap_or(80.0);
        if n < 2.0 || n.fract() != 0.0 {
            return Err(param_error(self.name(), "`n` must be an integer of at least 2"));
        }
        Ok(params.clone())
    }

    fn compute_group(&self, data: &DataTable, _ctx: &StatContext, params: &Params) -> Result<DataTable> {
        let xs = numeric_column(data, self.name(), "x")?;
        let ys = numeric_column(data, self.name(), "y")?;
        let pairs: Vec<(f64, f64)> = xs
            .iter()
            .zip(ys)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| (x, y))
            .collect();
        let fit = match LinearFit::fit(&pairs) {
            Some(f) => f,
            None => return Ok(DataTable::new()),
        };

        let n_out = params.get_f64("n").unwrap_or(80.0) as usize;
        let with_se = params.get_bool("se").unwrap_or(true);
        let level = params.get_f64("level").unwrap_or(0.95);
        let df = pairs.len() as f64 - 2.0;
        let t = if df > 0.0 { t_quantile(0.5 + level / 2.0, df) } else { 0.0 };

        let step = (fit.x_max - fit.x_min) / (n_out - 1) as f64;
        let grid: Vec<f64> = (0..n_out).map(|i| fit.x_min + i as f64 * step).collect();
        let fitted: Vec<f64> = grid.iter().map(|&x| fit.predict(x)).collect();
        let se: Vec<f64> = grid.iter().map(|&x| fit.std_error(x)).collect();

        let mut columns = vec![
            ("x", Column::Numeric(grid)),
            ("y", Column::Numeric(fitted.clone())),
        ];
        if with_se {
            columns.push(("ymin", Column::Numeric(fitted.iter().zip(&se).map(|(y, s)| y - t * s).collect())));
            columns.push(("ymax", Column::Numeric(fitted.iter().zip(&se).map(|(y, s)| y + t * s).collect())));
            columns.push(("se", Column::Numeric(se)));
        }
        DataTable::from_columns(columns)
    }
}

#[derive(Debug, Clone, Copy)]
struct LinearFit {
    slope: f64,
    intercept: f64,
    n: f64,
    x_mean: f64,
    sxx: f64,
    sigma: f64,
    x_min: f64,
    x_max: f64,
}

impl LinearFit {
    /// `None` with fewer than two points or no spread in x.
    fn fit(pairs: &[(f64, f64)]) -> Option<LinearFit> {
        if pairs.len() < 2 {
            return None;
        }
        let n = pairs.len() as f64;
        let x_mean = pairs.iter().map(|p| p.0).sum::<f64>() / n;
        let y_mean = pairs.iter().map(|p| p.1).sum::<f64>() / n;
        let sxx: f64 = pairs.iter().map(|(x, _)| (x - x_mean).powi(2)).sum();
        if sxx == 0.0 {
            return None;
        }
        let sxy: f64 = pairs.iter().map(|(x, y)| (x - x_mean) * (y - y_mean)).sum();
        let slope = sxy / sxx;
        let intercept = y_mean - slope * x_mean;
        let rss: f64 = pairs
            .iter()
            .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum();
        let sigma = if pairs.len() > 2 { (rss / (n - 2.0)).sqrt() } else { 0.0 };
        let (x_min, x_max) = pairs
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (x, _)| (lo.min(*x), hi.max(*x)));
        Some(LinearFit {
            slope,
            intercept,
            n,
            x_mean,
            sxx,
            sigma,
            x_min,
            x_max,
        })
    }

    fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    fn std_error(&self, x: f64) -> f64 {
        self.sigma * (1.0 / self.n + (x - self.x_mean).powi(2) / self.sxx).sqrt()
    }
}

/// Standard normal quantile (Acklam's rational approximation).
fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969683028665376e1,
        2.209460984245205e2,
        -2.759285104469687e2,
        1.383577518672690e2,
        -3.066479806614716e1,
        2.506628277459239,
    ];
    const B: [f64; 5] = [
        -5.447609879822406e1,
        1.615858368580409e2,
        -1.556989798598866e2,
        6.680131188771972e1,
        -1.328068155288572e1,
    ];
    const C: [f64; 6] = [
        -7.784894002430293e-3,
        -3.223964580411365e-1,
        -2.400758277161838,
        -2.549732539343734,
        4.374664141464968,
        2.938163982698783,
    ];
    const D: [f64; 4] = [
        7.784695709041462e-3,
        3.224671290700398e-1,
        2.445134137142996,
        3.754408661907416,
    ];
    const P_LOW: f64 = 0.02425;

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -normal_quantile(1.0 - p)
    }
}

/// Student t quantile via the Cornish-Fisher expansion around the normal.
fn t_quantile(p: f64, df: f64) -> f64 {
    let z = normal_quantile(p);
    let z3 = z.powi(3);
    let z5 = z.powi(5);
    let z7 = z.powi(7);
    z + (z3 + z) / (4.0 * df)
        + (5.0 * z5 + 16.0 * z3 + 3.0 * z) / (96.0 * df.powi(2))
        + (3.0 * z7 + 19.0 * z5 + 17.0 * z3 - 15.0 * z) / (384.0 * df.powi(3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlotError;
    use crate::stat::run_stat;

    fn data(xs: Vec<f64>, ys: Vec<f64>) -> DataTable {
        DataTable::from_columns(vec![("x", Column::Numeric(xs)), ("y", Column::Numeric(ys))]).unwrap()
    }

    #[test]
    fn test_exact_line() {
        let d = data(vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![1.0, 3.0, 5.0, 7.0, 9.0]);
        let out = run_stat(&StatSmooth, &d, &Params::new()).unwrap();
        assert_eq!(out.nrow(), 80);
        let x = out.numeric("x").unwrap();
        let y = out.numeric("y").unwrap();
        assert_eq!(x[0], 0.0);
        assert!((x[79] - 4.0).abs() < 1e-9);
        assert!((y[0] - 1.0).abs() < 1e-9);
        assert!((y[79] - 9.0).abs() < 1e-9);
        assert!(out.numeric("se").unwrap().iter().all(|s| s.abs() < 1e-9));
    }

    #[test]
    fn test_band_contains_fit() {
        let d = data(vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![1.2, 2.7, 5.3, 6.8, 9.1]);
        let out = run_stat(&StatSmooth, &d, &Params::new().with("n", 5.0)).unwrap();
        let y = out.numeric("y").unwrap();
        let lo = out.numeric("ymin").unwrap();
        let hi = out.numeric("ymax").unwrap();
        for i in 0..5 {
            assert!(lo[i] < y[i] && y[i] < hi[i]);
        }
        // Band is narrowest at the mean of x
        assert!(hi[2] - lo[2] < hi[0] - lo[0]);
    }

    #[test]
    fn test_without_se() {
        let d = data(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.5]);
        let out = run_stat(&StatSmooth, &d, &Params::new().with("se", false)).unwrap();
        assert!(!out.has("ymin"));
    }

    #[test]
    fn test_degenerate_groups_are_empty() {
        let out = run_stat(&StatSmooth, &data(vec![1.0], vec![2.0]), &Params::new()).unwrap();
        assert!(out.is_empty());
        let out = run_stat(&StatSmooth, &data(vec![1.0, 1.0], vec![2.0, 3.0]), &Params::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_unknown_method() {
        let err = run_stat(
            &StatSmooth,
            &data(vec![1.0, 2.0], vec![1.0, 2.0]),
            &Params::new().with("method", "loess"),
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::StatParameter { .. }));
    }

    #[test]
    fn test_t_quantile() {
        assert!((normal_quantile(0.975) - 1.959964).abs() < 1e-5);
        assert!((t_quantile(0.975, 10.0) - 2.228).abs() < 0.01);
        assert!((t_quantile(0.975, 30.0) - 2.042).abs() < 0.005);
    }
}
