//! Variable catalog: normalized metadata for every requested variable.

use crate::api::DataSource;
use crate::error::{Error, Result};
use crate::models::{Variable, VariableMeta};
use crate::storage;
use ahash::{AHashMap, AHashSet};
use log::{info, warn};
use std::path::Path;

/// Separator placed between hierarchical name levels.
pub const NAME_SEPARATOR: &str = " - ";
/// Highest name level (`nK`) looked at.
pub const MAX_NAME_LEVEL: usize = 9;

/// Normalize raw metadata into a catalog row.
///
/// The display name is `n1 - n2 - …`, stopping at the first missing level.
/// A variable without `n1` is rejected with `Error::Parse`.
pub fn parse_variable(meta: VariableMeta) -> Result<Variable> {
    let parts: Vec<&str> = (1..=MAX_NAME_LEVEL)
        .map_while(|level| meta.name_level(level))
        .collect();
    if parts.is_empty() {
        return Err(Error::Parse(format!(
            "variable {} has no name levels",
            meta.id
        )));
    }
    let variable_name = parts.join(NAME_SEPARATOR);
    Ok(Variable {
        variable_id: meta.id,
        variable_name,
        variable_unit: meta.measure_unit_name,
        variable_subject_id: meta.subject_id,
    })
}

/// Ordered variable catalog with lookup by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    variables: Vec<Variable>,
}

impl Catalog {
    pub fn new(variables: Vec<Variable>) -> Self {
        Self { variables }
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Variable ids in catalog order; this is what gets requested per unit.
    pub fn variable_ids(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.variable_id.clone()).collect()
    }

    /// Index by id. On duplicate ids the first entry wins.
    pub fn index(&self) -> AHashMap<&str, &Variable> {
        let mut map = AHashMap::with_capacity(self.variables.len());
        for v in &self.variables {
            map.entry(v.variable_id.as_str()).or_insert(v);
        }
        map
    }
}

/// Fetch metadata for each id in order, persist the catalog to `dest`, and return it.
///
/// Duplicate ids are fetched again and produce duplicate rows; they are logged.
pub fn build_catalog<S: DataSource + ?Sized>(
    source: &S,
    variable_ids: &[String],
    dest: &Path,
) -> Result<Catalog> {
    info!("Fetching metadata for {} variables", variable_ids.len());
    let mut seen = AHashSet::new();
    let mut variables = Vec::with_capacity(variable_ids.len());
    for id in variable_ids {
        if !seen.insert(id.as_str()) {
            warn!("variable {} listed more than once; catalog will contain duplicates", id);
        }
        let meta = source.variable_meta(id)?;
        variables.push(parse_variable(meta)?);
    }
    let catalog = Catalog::new(variables);
    storage::save_catalog_csv(&catalog, dest)?;
    info!("Saved {} variables to {}", catalog.len(), dest.display());
    Ok(catalog)
}
