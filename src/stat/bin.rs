use super::{finite_range, numeric_column, param_error, Stat, StatContext};
use crate::data::{Column, DataTable};
use crate::error::Result;
use crate::params::Params;

/// Histogram binning. Every group shares the same bins, laid over the
/// layer-wide x range and centred so the first bin is centred on the minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatBin;

/// Upper bound on the number of bins a layer may produce.
const MAX_BINS: usize = 100_000;

impl StatBin {
    /// Bin width and left edge of the first bin.
    fn layout(range: (f64, f64), params: &Params) -> (f64, f64, usize) {
        let (min, max) = range;
        let span = max - min;
        let width = match params.get_f64("binwidth") {
            Some(w) => w,
            None => {
                let bins = params.get_f64("bins").unwrap_or(30.0) as usize;
                if span == 0.0 {
                    1.0
                } else if bins > 1 {
                    span / (bins - 1) as f64
                } else {
                    span
                }
            }
        };
        let start = min - width / 2.0;
        let count = (((max - start) / width).floor() as usize + 1).max(1);
        (width, start, count)
    }
}

impl Stat for StatBin {
    fn name(&self) -> &'static str {
        "bin"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x"]
    }

    fn default_params(&self) -> Params {
        Params::new().with("bins", 30.0)
    }

    fn computed_aes(&self) -> &'static [(&'static str, &'static str)] {
        &[("y", "count")]
    }

    fn setup_params(&self, data: &DataTable, params: &Params) -> Result<Params> {
        if let Some(bins) = params.get_f64("bins") {
            if bins < 1.0 || bins.fract() != 0.0 {
                return Err(param_error(self.name(), "`bins` must be a positive integer"));
            }
            if bins > MAX_BINS as f64 {
                return Err(param_error(self.name(), format!("`bins` must not exceed {}", MAX_BINS)));
            }
        }
        if let Some(w) = params.get_f64("binwidth") {
            if !(w > 0.0) || !w.is_finite() {
                return Err(param_error(self.name(), "`binwidth` must be positive"));
            }
            if let Some((min, max)) = data.numeric("x").and_then(finite_range) {
                if (max - min) / w + 1.0 > MAX_BINS as f64 {
                    return Err(param_error(
                        self.name(),
                        format!("`binwidth` {} gives more than {} bins over [{}, {}]", w, MAX_BINS, min, max),
                    ));
                }
            }
        }
        Ok(params.clone())
    }

    fn compute_group(&self, data: &DataTable, ctx: &StatContext, params: &Params) -> Result<DataTable> {
        let xs = numeric_column(data, self.name(), "x")?;
        let range = match ctx.x_range {
            Some(r) => r,
            None => return Ok(DataTable::new()),
        };
        let (width, start, nbins) = Self::layout(range, params);
        let weights = data.numeric("weight");

        let mut counts = vec![0.0; nbins];
        for (i, &x) in xs.iter().enumerate() {
            if !x.is_finite() {
                continue;
            }
            let idx = (((x - start) / width).floor() as usize).min(nbins - 1);
            counts[idx] += weights.map(|w| w[i]).unwrap_or(1.0);
        }

        let total: f64 = counts.iter().sum();
        let max_count = counts.iter().cloned().fold(0.0, f64::max);
        let xmin: Vec<f64> = (0..nbins).map(|i| start + i as f64 * width).collect();
        let density: Vec<f64> = counts
            .iter()
            .map(|c| if total > 0.0 { c / (total * width) } else { 0.0 })
            .collect();

        DataTable::from_columns(vec![
            ("x", Column::Numeric(xmin.iter().map(|l| l + width / 2.0).collect())),
            ("xmin", Column::Numeric(xmin.clone())),
            ("xmax", Column::Numeric(xmin.iter().map(|l| l + width).collect())),
            ("count", Column::Numeric(counts.clone())),
            ("density", Column::Numeric(density)),
            (
                "ncount",
                Column::Numeric(
                    counts
                        .iter()
                        .map(|c| if max_count > 0.0 { c / max_count } else { 0.0 })
                        .collect(),
                ),
            ),
            ("width", Column::Numeric(vec![width; nbins])),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlotError;
    use crate::stat::run_stat;

    fn data(xs: Vec<f64>) -> DataTable {
        DataTable::from_columns(vec![("x", Column::Numeric(xs))]).unwrap()
    }

    #[test]
    fn test_bins_cover_all_rows() {
        let d = data(vec![0.0, 1.0, 2.0, 3.0, 4.0, 4.0]);
        let out = run_stat(&StatBin, &d, &Params::new().with("bins", 5.0)).unwrap();
        assert_eq!(out.nrow(), 5);
        assert_eq!(out.numeric("count").unwrap(), &[1.0, 1.0, 1.0, 1.0, 2.0]);
        assert_eq!(out.numeric("x").unwrap(), &[0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(out.numeric("width").unwrap()[0], 1.0);
    }

    #[test]
    fn test_density_integrates_to_one() {
        let d = data(vec![0.5, 1.5, 1.7, 3.2, 9.9]);
        let out = run_stat(&StatBin, &d, &Params::new().with("binwidth", 2.0)).unwrap();
        let area: f64 = out
            .numeric("density")
            .unwrap()
            .iter()
            .zip(out.numeric("width").unwrap())
            .map(|(d, w)| d * w)
            .sum();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_range() {
        let out = run_stat(&StatBin, &data(vec![2.0, 2.0]), &Params::new()).unwrap();
        assert_eq!(out.nrow(), 1);
        assert_eq!(out.numeric("count").unwrap(), &[2.0]);
    }

    #[test]
    fn test_invalid_bins() {
        let err = run_stat(&StatBin, &data(vec![1.0]), &Params::new().with("bins", 0.0)).unwrap_err();
        assert!(matches!(err, PlotError::StatParameter { .. }));
        let err = run_stat(&StatBin, &data(vec![1.0]), &Params::new().with("binwidth", -1.0)).unwrap_err();
        assert!(matches!(err, PlotError::StatParameter { .. }));
    }

    #[test]
    fn test_bin_count_is_bounded() {
        let d = data(vec![0.0, 1.0]);
        let err = run_stat(&StatBin, &d, &Params::new().with("bins", 2e18)).unwrap_err();
        assert!(matches!(err, PlotError::StatParameter { .. }));
        let err = run_stat(&StatBin, &d, &Params::new().with("binwidth", 1e-12)).unwrap_err();
        assert!(matches!(err, PlotError::StatParameter { .. }));
        assert!(run_stat(&StatBin, &d, &Params::new().with("bins", MAX_BINS as f64)).is_ok());
    }
}
