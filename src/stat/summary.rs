use super::{mean, numeric_column, param_error, percentile, rows_by_x, sorted_finite, std_dev, Stat, StatContext};
use crate::data::{Column, DataTable};
use crate::error::Result;
use crate::params::Params;

/// Summarises y at each distinct x.
///
/// `fun` selects the summary: `mean_sd` (mean ± one standard deviation),
/// `mean_se` (mean ± one standard error) or `range` (median with min/max).
#[derive(Debug, Clone, Copy, Default)]
pub struct StatSummary;

const FUNCTIONS: &[&str] = &["mean_sd", "mean_se", "range"];

impl Stat for StatSummary {
    fn name(&self) -> &'static str {
        "summary"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x", "y"]
    }

    fn default_params(&self) -> Params {
        Params::new().with("fun", "mean_sd")
    }

    fn setup_params(&self, _data: &DataTable, params: &Params) -> Result<Params> {
        let fun = params.get_str("fun").unwrap_or("mean_sd");
        if !FUNCTIONS.contains(&fun) {
            return Err(param_error(
                self.name(),
                format!("unknown summary function '{}', expected one of {}", fun, FUNCTIONS.join(", ")),
            ));
        }
        Ok(params.clone())
    }

    fn compute_group(&self, data: &DataTable, _ctx: &StatContext, params: &Params) -> Result<DataTable> {
        let xs = numeric_column(data, self.name(), "x")?;
        let ys = numeric_column(data, self.name(), "y")?;
        let fun = params.get_str("fun").unwrap_or("mean_sd");

        let mut out_x = Vec::new();
        let mut out_y = Vec::new();
        let mut out_min = Vec::new();
        let mut out_max = Vec::new();
        for (x, rows) in rows_by_x(xs) {
            let values: Vec<f64> = rows.iter().map(|&i| ys[i]).collect();
            let sorted = sorted_finite(&values);
            if sorted.is_empty() {
                continue;
            }
            let (centre, lo, hi) = match fun {
                "range" => (percentile(&sorted, 0.5), sorted[0], sorted[sorted.len() - 1]),
                _ => {
                    let m = mean(&sorted);
                    let mut spread = std_dev(&sorted);
                    if fun == "mean_se" {
                        spread /= (sorted.len() as f64).sqrt();
                    }
                    // One observation has no spread
                    let spread = if spread.is_finite() { spread } else { 0.0 };
                    (m, m - spread, m + spread)
                }
            };
            out_x.push(x);
            out_y.push(centre);
            out_min.push(lo);
            out_max.push(hi);
        }

        DataTable::from_columns(vec![
            ("x", Column::Numeric(out_x)),
            ("y", Column::Numeric(out_y)),
            ("ymin", Column::Numeric(out_min)),
            ("ymax", Column::Numeric(out_max)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlotError;
    use crate::stat::run_stat;

    fn data() -> DataTable {
        DataTable::from_columns(vec![
            ("x", Column::Numeric(vec![1.0, 1.0, 1.0, 2.0])),
            ("y", Column::Numeric(vec![1.0, 2.0, 3.0, 5.0])),
        ])
        .unwrap()
    }

    #[test]
    fn test_mean_sd() {
        let out = run_stat(&StatSummary, &data(), &Params::new()).unwrap();
        assert_eq!(out.numeric("y").unwrap(), &[2.0, 5.0]);
        assert_eq!(out.numeric("ymin").unwrap(), &[1.0, 5.0]);
        assert_eq!(out.numeric("ymax").unwrap(), &[3.0, 5.0]);
    }

    #[test]
    fn test_range() {
        let out = run_stat(&StatSummary, &data(), &Params::new().with("fun", "range")).unwrap();
        assert_eq!(out.numeric("ymin").unwrap(), &[1.0, 5.0]);
        assert_eq!(out.numeric("ymax").unwrap(), &[3.0, 5.0]);
    }

    #[test]
    fn test_unknown_function() {
        let err = run_stat(&StatSummary, &data(), &Params::new().with("fun", "mode")).unwrap_err();
        assert!(matches!(err, PlotError::StatParameter { .. }));
    }
}
