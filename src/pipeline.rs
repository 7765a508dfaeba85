//! End-to-end run: catalog → per-unit fetch → join → pivot → export.
//!
//! Units are fetched strictly one at a time in input order; the first error
//! aborts the run and nothing after it is written.

use crate::api::{Client, DataSource};
use crate::catalog::{Catalog, build_catalog};
use crate::config::Config;
use crate::error::Result;
use crate::reshape::{WideTable, left_join, pivot};
use crate::storage;
use log::{info, warn};

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub catalog: Catalog,
    pub observations: usize,
    pub table: WideTable,
}

pub struct Pipeline<S: DataSource> {
    source: S,
    config: Config,
}

impl Pipeline<Client> {
    /// Pipeline against the live API described by `config`.
    pub fn from_config(config: Config) -> Self {
        let client = Client::from_config(&config);
        Self::new(client, config)
    }
}

impl<S: DataSource> Pipeline<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self { source, config }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self) -> Result<RunSummary> {
        let cfg = &self.config;
        let unit_ids = cfg.unit_ids.load()?;
        info!("Fetching data for {} territorial units", unit_ids.len());
        let variable_ids = cfg.variable_ids.load()?;

        let catalog = build_catalog(&self.source, &variable_ids, &cfg.catalog_path)?;
        let requested = catalog.variable_ids();

        let mut observations = Vec::new();
        let total = unit_ids.len();
        for (i, unit_id) in unit_ids.iter().enumerate() {
            let rows = self
                .source
                .unit_observations(unit_id, &requested, &cfg.years)?;
            info!(
                "Fetched {:>30} ({}/{})... {} rows",
                unit_id,
                i + 1,
                total,
                rows.len()
            );
            if rows.is_empty() {
                warn!("unit {} returned no observations", unit_id);
            }
            observations.extend(rows);
        }

        let observation_count = observations.len();
        let joined = left_join(observations, &catalog);
        if let Some(path) = cfg.long_output_path.as_ref() {
            storage::save_long_csv(&joined, path)?;
            info!("Saved {} long rows to {}", joined.len(), path.display());
        }

        let table = pivot(&joined, &cfg.pivot)?;
        storage::save_wide_csv(&table, &cfg.output_path, cfg.write_bom)?;
        info!(
            "Saved {} rows to {}",
            table.rows.len(),
            cfg.output_path.display()
        );

        Ok(RunSummary {
            catalog,
            observations: observation_count,
            table,
        })
    }
}
