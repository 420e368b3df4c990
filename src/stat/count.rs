use super::{numeric_column, rows_by_x, Stat, StatContext};
use crate::data::{Column, DataTable};
use crate::error::Result;
use crate::params::Params;

/// Number of rows (or summed `weight`) at each distinct x.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatCount;

impl Stat for StatCount {
    fn name(&self) -> &'static str {
        "count"
    }

    fn required_aes(&self) -> &'static [&'static str] {
        &["x"]
    }

    fn default_params(&self) -> Params {
        Params::new().with("width", 0.9)
    }

    fn computed_aes(&self) -> &'static [(&'static str, &'static str)] {
        &[("y", "count")]
    }

    fn compute_group(&self, data: &DataTable, _ctx: &StatContext, params: &Params) -> Result<DataTable> {
        let xs = numeric_column(data, self.name(), "x")?;
        let weights = data.numeric("weight");
        let by_x = rows_by_x(xs);

        let counts: Vec<f64> = by_x
            .iter()
            .map(|(_, rows)| match weights {
                Some(w) => rows.iter().map(|&i| w[i]).sum(),
                None => rows.len() as f64,
            })
            .collect();
        let total: f64 = counts.iter().sum();
        let width = params.get_f64("width").unwrap_or(0.9);

        DataTable::from_columns(vec![
            ("x", Column::Numeric(by_x.iter().map(|(x, _)| *x).collect())),
            ("count", Column::Numeric(counts.clone())),
            ("prop", Column::Numeric(counts.iter().map(|c| c / total).collect())),
            ("width", Column::Numeric(vec![width; counts.len()])),
        ])
    }
}
