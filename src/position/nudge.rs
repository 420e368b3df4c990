use super::{map_numeric, Position};
use crate::aes::{X_AESTHETICS, Y_AESTHETICS};
use crate::data::DataTable;
use crate::error::Result;
use crate::params::Params;

/// Shifts every row by a fixed `x`/`y` offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionNudge;

impl Position for PositionNudge {
    fn name(&self) -> &'static str {
        "nudge"
    }

    fn default_params(&self) -> Params {
        Params::new().with("x", 0.0).with("y", 0.0)
    }

    fn compute_panel(&self, data: &DataTable, params: &Params) -> Result<DataTable> {
        let dx = params.get_f64("x").unwrap_or(0.0);
        let dy = params.get_f64("y").unwrap_or(0.0);
        let mut out = data.clone();
        for aes in X_AESTHETICS {
            out = map_numeric(out, aes, |_, v| v + dx)?;
        }
        for aes in Y_AESTHETICS {
            out = map_numeric(out, aes, |_, v| v + dy)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::position::run_position;

    #[test]
    fn test_nudge_shifts_positions_only() {
        let data = DataTable::from_columns(vec![
            ("x", Column::Numeric(vec![1.0, 2.0])),
            ("y", Column::Numeric(vec![3.0, 4.0])),
            ("size", Column::Numeric(vec![5.0, 6.0])),
        ])
        .unwrap();
        let out = run_position(&PositionNudge, &data, &Params::new().with("x", 0.5)).unwrap();
        assert_eq!(out.numeric("x").unwrap(), &[1.5, 2.5]);
        assert_eq!(out.numeric("y").unwrap(), &[3.0, 4.0]);
        assert_eq!(out.numeric("size").unwrap(), &[5.0, 6.0]);
    }
}
