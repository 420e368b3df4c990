use crate::data::{Column, DataTable};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read a CSV document with a header row into a [`DataTable`].
///
/// Column kinds are inferred per column: numeric when every non-empty cell
/// parses as a number (`NA` and empty cells become missing), text otherwise.
pub fn read_csv<R: Read>(source: R) -> Result<DataTable> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(source);

    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    let mut nrow = 0;
    for result in reader.records() {
        let record = result.context("Failed to read CSV record")?;
        for (j, field) in record.iter().enumerate() {
            cells[j].push(field.to_string());
        }
        nrow += 1;
    }

    if nrow == 0 {
        return Err(anyhow!("CSV must contain at least one data row"));
    }

    let mut table = DataTable::new();
    for (header, raw) in headers.into_iter().zip(cells) {
        if table.has(&header) {
            return Err(anyhow!("Duplicate CSV header '{}'", header));
        }
        table = table.with_column(header, Column::infer(raw))?;
    }
    Ok(table)
}

pub fn read_csv_from_stdin() -> Result<DataTable> {
    read_csv(io::stdin())
}

/// Load a data file, choosing CSV or JSON from the extension.
pub fn read_data_file(path: &Path) -> Result<DataTable> {
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let file =
        File::open(path).with_context(|| format!("Failed to open data file {}", path.display()))?;
    if is_json {
        let value: serde_json::Value = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
        DataTable::from_json(&value)
    } else {
        read_csv(file).with_context(|| format!("Failed to read CSV from {}", path.display()))
    }
}
