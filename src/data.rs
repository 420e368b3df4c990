use crate::error::{PlotError, Result};
use anyhow::anyhow;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Name of the panel id column added once facets are resolved.
pub const PANEL: &str = "PANEL";
/// Name of the group id column added once groups are resolved.
pub const GROUP: &str = "group";

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Num(f64),
    Str(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Num(v) => Some(*v),
            Value::Str(s) => s.parse().ok(),
        }
    }

    /// String form used for grouping keys and labels.
    pub fn key(&self) -> String {
        match self {
            Value::Num(v) => format_number(*v),
            Value::Str(s) => s.clone(),
        }
    }
}

/// Ordering used for facet panels and discrete keys: numbers before strings,
/// numbers numerically, strings lexicographically.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Num(x), Value::Num(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Value::Num(_), Value::Str(_)) => Ordering::Less,
        (Value::Str(_), Value::Num(_)) => Ordering::Greater,
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
    }
}

/// Format a number without superfluous trailing zeros.
pub fn format_number(v: f64) -> String {
    if v.is_nan() {
        return "NA".to_string();
    }
    if v == v.trunc() && v.abs() < 1e15 {
        return format!("{}", v as i64);
    }
    let s = format!("{:.6}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Discrete values with an explicit level order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Factor {
    levels: Vec<String>,
    codes: Vec<usize>,
}

impl Factor {
    pub fn new(levels: Vec<String>, codes: Vec<usize>) -> Result<Self> {
        if let Some(bad) = codes.iter().find(|&&c| c >= levels.len()) {
            return Err(PlotError::InvalidData(format!(
                "factor code {} out of range for {} levels",
                bad,
                levels.len()
            )));
        }
        Ok(Factor { levels, codes })
    }

    /// Build a factor from any column, sorting the distinct values the way
    /// `factor()` does: numerically for numbers, lexicographically otherwise.
    pub fn from_column(col: &Column) -> Factor {
        if let Column::Categorical(f) = col {
            return f.clone();
        }
        let mut distinct: Vec<Value> = Vec::new();
        let mut seen: HashMap<String, ()> = HashMap::new();
        for i in 0..col.len() {
            let v = col.get(i);
            if seen.insert(v.key(), ()).is_none() {
                distinct.push(v);
            }
        }
        distinct.sort_by(compare_values);
        let levels: Vec<String> = distinct.iter().map(Value::key).collect();
        let index: HashMap<&str, usize> = levels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();
        let codes = (0..col.len()).map(|i| index[col.key(i).as_str()]).collect();
        Factor { levels, codes }
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn codes(&self) -> &[usize] {
        &self.codes
    }

    pub fn label(&self, i: usize) -> &str {
        &self.levels[self.codes[i]]
    }

    /// Levels that actually occur, in level order.
    pub fn used_levels(&self) -> Vec<String> {
        let mut used = vec![false; self.levels.len()];
        for &c in &self.codes {
            used[c] = true;
        }
        self.levels
            .iter()
            .zip(used)
            .filter(|(_, u)| *u)
            .map(|(l, _)| l.clone())
            .collect()
    }
}

/// A homogeneous column of values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum Column {
    /// Numbers; NaN marks a missing value.
    Numeric(Vec<f64>),
    /// Discrete values with explicit level order.
    Categorical(Factor),
    /// Discrete strings; level order is first-seen order.
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Categorical(f) => f.codes.len(),
            Column::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_discrete(&self) -> bool {
        !matches!(self, Column::Numeric(_))
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn get(&self, i: usize) -> Value {
        match self {
            Column::Numeric(v) => Value::Num(v[i]),
            Column::Categorical(f) => Value::Str(f.label(i).to_string()),
            Column::Text(v) => Value::Str(v[i].clone()),
        }
    }

    pub fn key(&self, i: usize) -> String {
        match self {
            Column::Numeric(v) => format_number(v[i]),
            Column::Categorical(f) => f.label(i).to_string(),
            Column::Text(v) => v[i].clone(),
        }
    }

    /// Numeric view of row `i`; discrete values parse when they look numeric.
    pub fn f64_at(&self, i: usize) -> f64 {
        match self {
            Column::Numeric(v) => v[i],
            other => other.key(i).parse().unwrap_or(f64::NAN),
        }
    }

    /// Repeat one value `n` times.
    pub fn repeat(value: &Value, n: usize) -> Column {
        match value {
            Value::Num(v) => Column::Numeric(vec![*v; n]),
            Value::Str(s) => Column::Text(vec![s.clone(); n]),
        }
    }

    /// Distinct values in level order: factor levels in declared order (only
    /// those that occur), text and numbers in first-seen order.
    pub fn observed_levels(&self) -> Vec<String> {
        match self {
            Column::Categorical(f) => f.used_levels(),
            _ => {
                let mut seen = HashMap::new();
                let mut out = Vec::new();
                for i in 0..self.len() {
                    let k = self.key(i);
                    if seen.insert(k.clone(), ()).is_none() {
                        out.push(k);
                    }
                }
                out
            }
        }
    }

    pub fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Numeric(v) => Column::Numeric(indices.iter().map(|&i| v[i]).collect()),
            Column::Categorical(f) => Column::Categorical(Factor {
                levels: f.levels.clone(),
                codes: indices.iter().map(|&i| f.codes[i]).collect(),
            }),
            Column::Text(v) => Column::Text(indices.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// Concatenate columns of the same kind. Factors merge their levels.
    pub fn concat(parts: &[&Column]) -> Result<Column> {
        let first = match parts.first() {
            Some(c) => *c,
            None => return Ok(Column::Numeric(Vec::new())),
        };
        match first {
            Column::Numeric(_) => {
                let mut out = Vec::new();
                for p in parts {
                    match p {
                        Column::Numeric(v) => out.extend_from_slice(v),
                        _ => return Err(mixed_kinds()),
                    }
                }
                Ok(Column::Numeric(out))
            }
            Column::Text(_) => {
                let mut out = Vec::new();
                for p in parts {
                    match p {
                        Column::Text(v) => out.extend(v.iter().cloned()),
                        _ => return Err(mixed_kinds()),
                    }
                }
                Ok(Column::Text(out))
            }
            Column::Categorical(_) => {
                let mut levels: Vec<String> = Vec::new();
                let mut index: HashMap<String, usize> = HashMap::new();
                let mut codes = Vec::new();
                for p in parts {
                    let f = match p {
                        Column::Categorical(f) => f,
                        _ => return Err(mixed_kinds()),
                    };
                    for l in &f.levels {
                        if !index.contains_key(l) {
                            index.insert(l.clone(), levels.len());
                            levels.push(l.clone());
                        }
                    }
                    codes.extend(f.codes.iter().map(|&c| index[&f.levels[c]]));
                }
                Ok(Column::Categorical(Factor { levels, codes }))
            }
        }
    }

    /// Infer a column from raw strings: numeric when every non-missing cell parses.
    pub fn infer(raw: Vec<String>) -> Column {
        let is_missing = |s: &str| s.is_empty() || s == "NA";
        let all_numeric = raw
            .iter()
            .all(|s| is_missing(s) || s.trim().parse::<f64>().is_ok());
        let any_value = raw.iter().any(|s| !is_missing(s));
        if all_numeric && any_value {
            Column::Numeric(
                raw.iter()
                    .map(|s| s.trim().parse::<f64>().unwrap_or(f64::NAN))
                    .collect(),
            )
        } else {
            Column::Text(raw)
        }
    }
}

fn mixed_kinds() -> PlotError {
    PlotError::InvalidData("cannot concatenate columns of different kinds".to_string())
}

/// An ordered collection of equal-length named columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DataTable {
    columns: IndexMap<String, Column>,
    nrow: usize,
}

impl DataTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty table with a fixed row count, used to broadcast constants.
    pub fn with_rows(nrow: usize) -> Self {
        DataTable {
            columns: IndexMap::new(),
            nrow,
        }
    }

    pub fn from_columns<S: Into<String>>(columns: Vec<(S, Column)>) -> Result<Self> {
        let mut table = DataTable::new();
        for (name, col) in columns {
            table = table.with_column(name, col)?;
        }
        Ok(table)
    }

    pub fn nrow(&self) -> usize {
        self.nrow
    }

    pub fn ncol(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nrow == 0
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn has(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn numeric(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).and_then(Column::as_numeric)
    }

    /// Return a new table with `name` added or replaced.
    pub fn with_column<S: Into<String>>(mut self, name: S, col: Column) -> Result<Self> {
        let name = name.into();
        let only_this = self.columns.len() == 1 && self.columns.contains_key(&name);
        if self.columns.is_empty() && self.nrow == 0 || only_this {
            self.nrow = col.len();
        } else if col.len() != self.nrow {
            return Err(PlotError::InvalidData(format!(
                "column '{}' has {} rows, table has {}",
                name,
                col.len(),
                self.nrow
            )));
        }
        self.columns.insert(name, col);
        Ok(self)
    }

    pub fn without(mut self, name: &str) -> Self {
        self.columns.shift_remove(name);
        self
    }

    /// Copy of the selected rows, in the given order.
    pub fn take(&self, indices: &[usize]) -> DataTable {
        DataTable {
            columns: self
                .columns
                .iter()
                .map(|(k, c)| (k.clone(), c.take(indices)))
                .collect(),
            nrow: indices.len(),
        }
    }

    pub fn filter(&self, keep: &[bool]) -> DataTable {
        let indices: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter(|(_, k)| **k)
            .map(|(i, _)| i)
            .collect();
        self.take(&indices)
    }

    /// Stack tables vertically. Tables without rows are skipped; the rest
    /// must share their column names.
    pub fn concat(tables: &[DataTable]) -> Result<DataTable> {
        let non_empty: Vec<&DataTable> = tables.iter().filter(|t| t.nrow > 0).collect();
        let first = match non_empty.first() {
            Some(t) => *t,
            None => {
                return Ok(tables
                    .iter()
                    .find(|t| t.ncol() > 0)
                    .map(|t| t.take(&[]))
                    .unwrap_or_default())
            }
        };
        let mut out = DataTable::new();
        for name in first.columns.keys() {
            let mut parts = Vec::with_capacity(non_empty.len());
            for t in &non_empty {
                let col = t.columns.get(name).ok_or_else(|| {
                    PlotError::InvalidData(format!("column '{}' missing while concatenating", name))
                })?;
                parts.push(col);
            }
            out = out.with_column(name.clone(), Column::concat(&parts)?)?;
        }
        Ok(out)
    }

    /// Row indices grouped by the integer value of a numeric id column,
    /// sorted by id.
    pub fn split_by_id(&self, name: &str) -> Vec<(i64, Vec<usize>)> {
        let mut groups: IndexMap<i64, Vec<usize>> = IndexMap::new();
        match self.numeric(name) {
            Some(ids) => {
                for (i, id) in ids.iter().enumerate() {
                    groups.entry(*id as i64).or_default().push(i);
                }
            }
            None => {
                groups.insert(1, (0..self.nrow).collect());
            }
        }
        let mut out: Vec<(i64, Vec<usize>)> = groups.into_iter().collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    /// First value of a column, if any row exists.
    pub fn first_value(&self, name: &str) -> Option<Value> {
        self.column(name)
            .filter(|c| !c.is_empty())
            .map(|c| c.get(0))
    }

    /// Create a table from a JSON array of objects.
    pub fn from_json(value: &JsonValue) -> anyhow::Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| anyhow!("Input data must be a JSON array of objects"))?;

        if array.is_empty() {
            return Err(anyhow!("Input data array is empty"));
        }

        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| anyhow!("Items in array must be objects"))?;
        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let mut raw: Vec<Vec<String>> = vec![Vec::with_capacity(array.len()); headers.len()];
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| anyhow!("Items in array must be objects"))?;
            for (j, header) in headers.iter().enumerate() {
                let cell = match obj.get(header) {
                    Some(JsonValue::String(s)) => s.clone(),
                    Some(JsonValue::Number(n)) => n.to_string(),
                    Some(JsonValue::Bool(b)) => b.to_string(),
                    Some(JsonValue::Null) | None => String::new(),
                    _ => return Err(anyhow!("Unsupported value type for field '{}'", header)),
                };
                raw[j].push(cell);
            }
        }

        let mut table = DataTable::new();
        for (header, cells) in headers.into_iter().zip(raw) {
            table = table.with_column(header, Column::infer(cells))?;
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataTable {
        DataTable::from_columns(vec![
            ("x", Column::Numeric(vec![1.0, 2.0, 3.0])),
            ("g", Column::Text(vec!["b".into(), "a".into(), "b".into()])),
        ])
        .unwrap()
    }

    #[test]
    fn test_with_column_length_mismatch() {
        let res = sample().with_column("y", Column::Numeric(vec![1.0]));
        assert!(matches!(res, Err(PlotError::InvalidData(_))));
    }

    #[test]
    fn test_take_and_filter() {
        let t = sample();
        let sub = t.filter(&[true, false, true]);
        assert_eq!(sub.nrow(), 2);
        assert_eq!(sub.numeric("x").unwrap(), &[1.0, 3.0]);
        // Source table is untouched
        assert_eq!(t.nrow(), 3);
    }

    #[test]
    fn test_observed_levels_first_seen() {
        let t = sample();
        assert_eq!(t.column("g").unwrap().observed_levels(), vec!["b", "a"]);
    }

    #[test]
    fn test_factor_sorts_numerically() {
        let col = Column::Numeric(vec![10.0, 2.0, 10.0, 1.0]);
        let f = Factor::from_column(&col);
        assert_eq!(f.levels(), &["1", "2", "10"]);
        assert_eq!(f.codes(), &[2, 1, 2, 0]);
    }

    #[test]
    fn test_concat_merges_factor_levels() {
        let a = Column::Categorical(Factor::new(vec!["x".into()], vec![0, 0]).unwrap());
        let b = Column::Categorical(Factor::new(vec!["y".into(), "x".into()], vec![0, 1]).unwrap());
        let c = Column::concat(&[&a, &b]).unwrap();
        match c {
            Column::Categorical(f) => {
                assert_eq!(f.levels(), &["x", "y"]);
                assert_eq!(f.codes(), &[0, 0, 1, 0]);
            }
            _ => panic!("expected factor"),
        }
    }

    #[test]
    fn test_concat_skips_empty_tables() {
        let t = sample();
        let out = DataTable::concat(&[DataTable::new(), t.clone(), t]).unwrap();
        assert_eq!(out.nrow(), 6);
    }

    #[test]
    fn test_split_by_id_sorted() {
        let t = DataTable::from_columns(vec![("group", Column::Numeric(vec![2.0, 1.0, 2.0]))]).unwrap();
        let split = t.split_by_id("group");
        assert_eq!(split, vec![(1, vec![1]), (2, vec![0, 2])]);
    }

    #[test]
    fn test_infer_numeric_with_missing() {
        let col = Column::infer(vec!["1".into(), "".into(), "NA".into()]);
        let v = col.as_numeric().unwrap();
        assert_eq!(v[0], 1.0);
        assert!(v[1].is_nan() && v[2].is_nan());
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!([
            {"x": 1, "name": "a"},
            {"x": 2, "name": "b"}
        ]);
        let t = DataTable::from_json(&json).unwrap();
        assert_eq!(t.nrow(), 2);
        assert!(t.column("name").unwrap().is_discrete());
        assert_eq!(t.numeric("x").unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn test_from_json_empty() {
        let json = serde_json::json!([]);
        assert!(DataTable::from_json(&json).is_err());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
    }
}
