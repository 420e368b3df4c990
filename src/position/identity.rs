use super::Position;
use crate::data::DataTable;
use crate::error::Result;
use crate::params::Params;

/// Leaves positions untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionIdentity;

impl Position for PositionIdentity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn compute_panel(&self, data: &DataTable, _params: &Params) -> Result<DataTable> {
        Ok(data.clone())
    }
}
