//! CSV loading and writing for `pql eval`: a `--table PATH`
//! becomes a table named after the file's stem, with the first row read as
//! column names.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use pql_compiler::eval::Table;

pub fn load_table(path: &Path) -> Result<(String, Table)> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("{}: cannot derive a table name from this path", path.display()))?
        .to_string();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("{}: cannot open CSV file", path.display()))?;
    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("{}: cannot read CSV header row", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("{}: malformed CSV row", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok((name, Table::new(columns, rows)))
}

pub fn load_tables(paths: &[std::path::PathBuf]) -> Result<HashMap<String, Table>> {
    let mut tables = HashMap::with_capacity(paths.len());
    for path in paths {
        let (name, table) = load_table(path)?;
        tables.insert(name, table);
    }
    Ok(tables)
}

pub fn write_table(writer: &mut impl std::io::Write, table: &Table) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
    csv_writer.write_record(&table.columns)?;
    for row in &table.rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
