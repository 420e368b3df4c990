use super::{Stat, StatContext};
use crate::data::DataTable;
use crate::error::Result;
use crate::params::Params;

/// Leaves the data unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatIdentity;

impl Stat for StatIdentity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn compute_group(&self, data: &DataTable, _ctx: &StatContext, _params: &Params) -> Result<DataTable> {
        Ok(data.clone())
    }
}
