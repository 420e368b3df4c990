use super::{numeric_column, param_error, percentile, rows_by_x, sorted_finite, Stat, StatContext};
use crate::data::{Column, DataTable};
use crate::geom::pack_outliers;
use crate::error::Result;
use crate::params::Params;

/// Five-number summary per x. Whiskers reach the most extreme observations
/// within `coef` interquartile ranges of the box; the rest are outliers.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatBoxplot;

#[derive(Debug, Default)]
struct BoxColumns {
    x: Vec<f64>,
    ymin: Vec<f64>,
    lower: Vec<f64>,
    middle: Vec<f64>,
    upper: Vec<f64>,
    ymax: Vec<f64>,
    outliers: Vec<String>,
    ymin_final: Vec<f64>,
    ymax_final: Vec<f64>,
    n: Vec<f64>,
}

impl Stat for StatBoxplot {
    fn name(&self) -> &'static str {
        "boxplot"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["y"]
    }

    fn default_params(&self) -> Params {
        Params::new().with("coef", 1.5).with("width", 0.75)
    }

    fn setup_params(&self, _data: &DataTable, params: &Params) -> Result<Params> {
        match params.get_f64("coef") {
            Some(c) if c >= 0.0 => Ok(params.clone()),
            _ => Err(param_error(self.name(), "`coef` must be a non-negative number")),
        }
    }

    fn compute_group(&self, data: &DataTable, _ctx: &StatContext, params: &Params) -> Result<DataTable> {
        let ys = numeric_column(data, self.name(), "y")?;
        // A lone box sits at x = 0
        let default_x = vec![0.0; ys.len()];
        let xs = match data.column("x") {
            Some(_) => numeric_column(data, self.name(), "x")?,
            None => &default_x,
        };
        let coef = params.get_f64("coef").unwrap_or(1.5);
        let width = params.get_f64("width").unwrap_or(0.75);

        let mut out = BoxColumns::default();
        for (x, rows) in rows_by_x(xs) {
            let values: Vec<f64> = rows.iter().map(|&i| ys[i]).collect();
            let sorted = sorted_finite(&values);
            if sorted.is_empty() {
                continue;
            }
            let q1 = percentile(&sorted, 0.25);
            let median = percentile(&sorted, 0.5);
            let q3 = percentile(&sorted, 0.75);
            let iqr = q3 - q1;
            let lower_fence = q1 - coef * iqr;
            let upper_fence = q3 + coef * iqr;

            let inside: Vec<f64> = sorted
                .iter()
                .copied()
                .filter(|v| *v >= lower_fence && *v <= upper_fence)
                .collect();
            let outliers = pack_outliers(
                sorted
                    .iter()
                    .copied()
                    .filter(|v| *v < lower_fence || *v > upper_fence),
            );

            out.x.push(x);
            out.ymin.push(inside.first().copied().unwrap_or(q1));
            out.lower.push(q1);
            out.middle.push(median);
            out.upper.push(q3);
            out.ymax.push(inside.last().copied().unwrap_or(q3));
            out.outliers.push(outliers);
            out.ymin_final.push(sorted[0]);
            out.ymax_final.push(sorted[sorted.len() - 1]);
            out.n.push(sorted.len() as f64);
        }

        let rows = out.x.len();
        DataTable::from_columns(vec![
            ("x", Column::Numeric(out.x)),
            ("ymin", Column::Numeric(out.ymin)),
            ("lower", Column::Numeric(out.lower)),
            ("middle", Column::Numeric(out.middle)),
            ("upper", Column::Numeric(out.upper)),
            ("ymax", Column::Numeric(out.ymax)),
            ("outliers", Column::Text(out.outliers)),
            ("ymin_final", Column::Numeric(out.ymin_final)),
            ("ymax_final", Column::Numeric(out.ymax_final)),
            ("n", Column::Numeric(out.n)),
            ("width", Column::Numeric(vec![width; rows])),
        ])
    }
}
