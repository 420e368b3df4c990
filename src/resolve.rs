// Aesthetic resolution: evaluate a merged mapping, drop incomplete rows, assign groups

use crate::aes::{AesValue, AestheticSpec, Variables};
use crate::data::{Column, DataTable, Factor, GROUP, PANEL};
use crate::error::Result;
use std::collections::BTreeMap;
use tracing::debug;

/// Evaluate every entry of `spec` against `data`. Constants are broadcast.
pub fn evaluate_mapping(
    spec: &AestheticSpec,
    data: &DataTable,
    vars: &Variables,
) -> Result<DataTable> {
    let mut out = DataTable::with_rows(data.nrow());
    for (aes, value) in spec.iter() {
        let col = match value {
            AesValue::Expr(e) => e.evaluate(data, vars)?,
            AesValue::Const(v) => Column::repeat(v, data.nrow()),
        };
        out = out.with_column(aes, col)?;
    }
    Ok(out)
}

/// Keep-mask of rows whose numeric columns are all finite.
pub fn complete_rows(table: &DataTable) -> Vec<bool> {
    let mut keep = vec![true; table.nrow()];
    for (_, col) in table.columns() {
        if let Some(values) = col.as_numeric() {
            for (k, v) in keep.iter_mut().zip(values) {
                if !v.is_finite() {
                    *k = false;
                }
            }
        }
    }
    keep
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum KeyPart {
    Level(usize),
    Text(String),
    Number(i64),
}

fn key_part(col: &Column, i: usize) -> KeyPart {
    match col {
        Column::Categorical(f) => KeyPart::Level(f.codes()[i]),
        Column::Text(v) => KeyPart::Text(v[i].clone()),
        // Only explicit group columns reach here as numbers
        Column::Numeric(v) => KeyPart::Number((v[i] * 1e6).round() as i64),
    }
}

/// Add the 1-based `group` column.
///
/// An explicit `group` aesthetic is converted to ids in sorted order. Otherwise
/// rows sharing every discrete column (except `label`) share a group, with ids
/// following the sorted order of the value combinations. Tables without
/// discrete columns form a single group.
pub fn add_group_column(table: DataTable) -> Result<DataTable> {
    let n = table.nrow();
    let ids: Vec<f64> = if let Some(explicit) = table.column(GROUP) {
        let f = Factor::from_column(explicit);
        f.codes().iter().map(|&c| (c + 1) as f64).collect()
    } else {
        let discrete: Vec<&Column> = table
            .columns()
            .filter(|(name, col)| col.is_discrete() && *name != "label" && *name != PANEL)
            .map(|(_, col)| col)
            .collect();
        if discrete.is_empty() {
            vec![1.0; n]
        } else {
            let keys: Vec<Vec<KeyPart>> = (0..n)
                .map(|i| discrete.iter().map(|c| key_part(c, i)).collect())
                .collect();
            let mut index: BTreeMap<&Vec<KeyPart>, usize> = BTreeMap::new();
            for k in &keys {
                index.insert(k, 0);
            }
            for (i, v) in index.values_mut().enumerate() {
                *v = i + 1;
            }
            keys.iter().map(|k| index[k] as f64).collect()
        }
    };
    debug!(
        groups = ids.iter().cloned().fold(0.0, f64::max),
        rows = n,
        "assigned groups"
    );
    table.with_column(GROUP, Column::Numeric(ids))
}
