//! Newline-delimited identifier lists (territorial units, variables).

use crate::error::{Error, Result};
use std::path::Path;

/// Split text into trimmed identifiers, dropping blank lines. Order is preserved.
pub fn parse_id_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read an identifier list file. A missing file is an `Io` error.
pub fn read_id_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(parse_id_list(&text))
}
