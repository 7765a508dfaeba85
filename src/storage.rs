use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::models::JoinedRecord;
use crate::reshape::WideTable;
use csv::WriterBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Prefix text that a spreadsheet would evaluate as a formula.
fn sanitize(s: &str) -> String {
    match s.chars().next() {
        Some('=' | '+' | '@' | '\t' | '\r') => format!("'{}", s),
        _ => s.to_string(),
    }
}

fn opt_text(v: Option<&str>) -> String {
    v.map(sanitize).unwrap_or_default()
}

/// Shortest decimal form: `100.0` → `100`, `1.5` → `1.5`; missing → empty.
fn num(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn create(path: &Path, bom: bool) -> Result<BufWriter<File>> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let f = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut w = BufWriter::new(f);
    if bom {
        w.write_all(UTF8_BOM).map_err(|e| Error::io(path, e))?;
    }
    Ok(w)
}

/// Save the variable catalog as UTF-8 CSV with header.
pub fn save_catalog_csv<P: AsRef<Path>>(catalog: &Catalog, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().from_writer(create(path, false)?);
    wtr.write_record([
        "variable_id",
        "variable_name",
        "variable_unit",
        "variable_subject_id",
    ])?;
    for v in catalog.variables() {
        wtr.write_record([
            sanitize(&v.variable_id),
            sanitize(&v.variable_name),
            opt_text(v.variable_unit.as_deref()),
            opt_text(v.variable_subject_id.as_deref()),
        ])?;
    }
    wtr.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Save the wide table: index columns then one column per category, no row-number column.
///
/// With `bom` the file starts with a UTF-8 byte-order mark so spreadsheet tools
/// in non-UTF-8 locales pick the right encoding.
pub fn save_wide_csv<P: AsRef<Path>>(table: &WideTable, path: P, bom: bool) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().from_writer(create(path, bom)?);
    wtr.write_record(table.headers().into_iter().map(sanitize))?;
    for row in &table.rows {
        let record = row
            .index
            .iter()
            .map(|v| opt_text(v.as_deref()))
            .chain(row.cells.iter().map(|c| num(*c)));
        wtr.write_record(record)?;
    }
    wtr.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

/// Save joined records in long form (one row per observation).
pub fn save_long_csv<P: AsRef<Path>>(records: &[JoinedRecord], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().from_writer(create(path, false)?);
    wtr.write_record([
        "unit_id",
        "unit_name",
        "variable_id",
        "year",
        "value",
        "variable_name",
        "variable_unit",
        "variable_subject_id",
    ])?;
    for r in records {
        let o = &r.observation;
        wtr.write_record([
            sanitize(&o.unit_id),
            sanitize(&o.unit_name),
            sanitize(&o.variable_id),
            o.year.to_string(),
            num(o.value),
            opt_text(r.variable_name.as_deref()),
            opt_text(r.variable_unit.as_deref()),
            opt_text(r.variable_subject_id.as_deref()),
        ])?;
    }
    wtr.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}
