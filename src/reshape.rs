//! Left join of observations onto the catalog, and the long-to-wide pivot.
//!
//! The pivot is driven by a [`PivotSpec`]: a list of index columns that identify
//! an output row, and one category column whose distinct values become output
//! columns. Each (index, category) pair must occur at most once in the input.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::models::{JoinedRecord, Observation};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Attach catalog metadata to every observation.
///
/// Output order and length equal the input; variables missing from the
/// catalog get `None` metadata.
pub fn left_join(observations: Vec<Observation>, catalog: &Catalog) -> Vec<JoinedRecord> {
    let index = catalog.index();
    observations
        .into_iter()
        .map(|observation| {
            let var = index.get(observation.variable_id.as_str());
            JoinedRecord {
                variable_name: var.map(|v| v.variable_name.clone()),
                variable_unit: var.and_then(|v| v.variable_unit.clone()),
                variable_subject_id: var.and_then(|v| v.variable_subject_id.clone()),
                observation,
            }
        })
        .collect()
}

/// A field of a joined record usable as pivot index or category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    UnitId,
    UnitName,
    VariableId,
    VariableName,
    VariableUnit,
    VariableSubjectId,
    Year,
    /// Composite `[subject/id] name [unit]` label.
    VariableLabel,
}

impl Column {
    /// Header text used in exports.
    pub fn name(self) -> &'static str {
        match self {
            Column::UnitId => "unit_id",
            Column::UnitName => "unit_name",
            Column::VariableId => "variable_id",
            Column::VariableName => "variable_name",
            Column::VariableUnit => "variable_unit",
            Column::VariableSubjectId => "variable_subject_id",
            Column::Year => "year",
            Column::VariableLabel => "variable_name_and_unit",
        }
    }

    pub fn value_of(self, r: &JoinedRecord) -> Option<String> {
        let o = &r.observation;
        match self {
            Column::UnitId => Some(o.unit_id.clone()),
            Column::UnitName => Some(o.unit_name.clone()),
            Column::VariableId => Some(o.variable_id.clone()),
            Column::VariableName => r.variable_name.clone(),
            Column::VariableUnit => r.variable_unit.clone(),
            Column::VariableSubjectId => r.variable_subject_id.clone(),
            Column::Year => Some(o.year.to_string()),
            Column::VariableLabel => Some(r.variable_label()),
        }
    }
}

/// Which columns form the row key and which column is spread across.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotSpec {
    pub index: Vec<Column>,
    pub category: Column,
}

impl PivotSpec {
    /// One row per unit, one column per composite variable label.
    /// Needs a single-year filter; a second year is a duplicate key.
    pub fn by_variable_label() -> Self {
        Self {
            index: vec![Column::UnitName, Column::UnitId],
            category: Column::VariableLabel,
        }
    }

    /// One row per (unit, year), one column per composite variable label.
    ///
    /// Safe for any number of years per variable.
    pub fn by_unit_year() -> Self {
        Self {
            index: vec![Column::UnitName, Column::UnitId, Column::Year],
            category: Column::VariableLabel,
        }
    }

    /// One row per unit, one column per year. Only unambiguous with a single variable.
    pub fn by_year() -> Self {
        Self {
            index: vec![Column::UnitId, Column::UnitName],
            category: Column::Year,
        }
    }

    /// One row per (unit, variable), one column per year.
    pub fn by_variable_year() -> Self {
        Self {
            index: vec![
                Column::UnitId,
                Column::UnitName,
                Column::VariableId,
                Column::VariableName,
                Column::VariableUnit,
            ],
            category: Column::Year,
        }
    }
}

/// Sort key for category values: numeric when the value parses as an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CategoryKey(String);

impl CategoryKey {
    fn numeric(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl Ord for CategoryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for CategoryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One output row: index values followed by one cell per category column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    pub index: Vec<Option<String>>,
    pub cells: Vec<Option<f64>>,
}

/// Flat, row-based result of a pivot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideTable {
    pub index_columns: Vec<String>,
    pub category_columns: Vec<String>,
    pub rows: Vec<WideRow>,
}

impl WideTable {
    /// Header row: index column names, then category labels.
    pub fn headers(&self) -> Vec<&str> {
        self.index_columns
            .iter()
            .chain(self.category_columns.iter())
            .map(String::as_str)
            .collect()
    }

    /// Cell lookup by index values and category label.
    pub fn get(&self, index: &[Option<String>], category: &str) -> Option<f64> {
        let col = self.category_columns.iter().position(|c| c == category)?;
        self.rows
            .iter()
            .find(|r| r.index == index)
            .and_then(|r| r.cells.get(col).copied().flatten())
    }

    /// Back to long form: one `(index, category, value)` per non-empty cell.
    pub fn melt(&self) -> Vec<(Vec<Option<String>>, String, f64)> {
        let mut out = Vec::new();
        for row in &self.rows {
            for (cat, cell) in self.category_columns.iter().zip(&row.cells) {
                if let Some(v) = cell {
                    out.push((row.index.clone(), cat.clone(), *v));
                }
            }
        }
        out
    }
}

/// Spread `spec.category` across columns, one row per distinct index tuple.
///
/// Rows and columns come out sorted. A second record for an already filled
/// (index, category) cell is an `Error::Integrity`; it is never overwritten.
/// A record without a category value (e.g. the variable name of an
/// uncatalogued variable) is an `Error::MissingCategory`.
pub fn pivot(records: &[JoinedRecord], spec: &PivotSpec) -> Result<WideTable> {
    let mut cells: BTreeMap<Vec<Option<String>>, BTreeMap<CategoryKey, Option<f64>>> =
        BTreeMap::new();
    let mut categories: BTreeSet<CategoryKey> = BTreeSet::new();

    for r in records {
        let index: Vec<Option<String>> = spec.index.iter().map(|c| c.value_of(r)).collect();
        let Some(category) = spec.category.value_of(r) else {
            return Err(Error::MissingCategory {
                column: spec.category.name().to_string(),
                index,
            });
        };
        let row = cells.entry(index).or_default();
        let key = CategoryKey(category);
        if row.contains_key(&key) {
            let index = spec.index.iter().map(|c| c.value_of(r)).collect();
            return Err(Error::Integrity {
                index,
                category: key.0,
            });
        }
        row.insert(key.clone(), r.observation.value);
        categories.insert(key);
    }

    let category_keys: Vec<CategoryKey> = categories.into_iter().collect();
    let rows = cells
        .into_iter()
        .map(|(index, row)| WideRow {
            index,
            cells: category_keys
                .iter()
                .map(|k| row.get(k).copied().flatten())
                .collect(),
        })
        .collect();

    Ok(WideTable {
        index_columns: spec.index.iter().map(|c| c.name().to_string()).collect(),
        category_columns: category_keys.into_iter().map(|k| k.0).collect(),
        rows,
    })
}
