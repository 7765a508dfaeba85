//! Explicit pipeline configuration.

use crate::error::Result;
use crate::ids::read_id_list;
use crate::rate_limit::DEFAULT_DELAY;
use crate::reshape::PivotSpec;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://bdl.stat.gov.pl/api/v1";
/// Environment variable holding the client identifier sent as `X-ClientId`.
pub const CREDENTIAL_ENV: &str = "BDL_API_KEY";
pub const DEFAULT_UNITS_FILE: &str = "jednostki.txt";
pub const DEFAULT_VARIABLES_FILE: &str = "zmienne.txt";
pub const DEFAULT_CATALOG_PATH: &str = "data/variables.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "data/all_data.csv";

/// Where a list of identifiers comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    /// Identifiers given directly.
    Inline(Vec<String>),
    /// A newline-delimited file; blank lines are ignored.
    File(PathBuf),
}

impl IdSource {
    pub fn load(&self) -> Result<Vec<String>> {
        match self {
            IdSource::Inline(ids) => Ok(ids
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()),
            IdSource::File(path) => read_id_list(path),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    /// Client identifier; anonymous access when `None`.
    pub client_credential: Option<String>,
    pub unit_ids: IdSource,
    pub variable_ids: IdSource,
    /// Pause after every API call.
    pub rate_limit_delay: Duration,
    /// Language of variable metadata (`lang=` parameter).
    pub lang: String,
    /// Optional year filter for unit data; empty means all years.
    pub years: Vec<i32>,
    pub page_size: u32,
    pub catalog_path: PathBuf,
    pub output_path: PathBuf,
    /// Optional long-format export of the joined records.
    pub long_output_path: Option<PathBuf>,
    /// Prefix the wide CSV with a UTF-8 byte-order mark.
    pub write_bom: bool,
    pub pivot: PivotSpec,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.into(),
            client_credential: None,
            unit_ids: IdSource::File(DEFAULT_UNITS_FILE.into()),
            variable_ids: IdSource::File(DEFAULT_VARIABLES_FILE.into()),
            rate_limit_delay: DEFAULT_DELAY,
            lang: "pl".into(),
            years: Vec::new(),
            page_size: 100,
            catalog_path: DEFAULT_CATALOG_PATH.into(),
            output_path: DEFAULT_OUTPUT_PATH.into(),
            long_output_path: None,
            write_bom: true,
            pivot: PivotSpec::by_unit_year(),
        }
    }
}

impl Config {
    /// Fill `client_credential` from `BDL_API_KEY` when it is set and non-empty.
    pub fn with_env_credential(mut self) -> Self {
        if let Ok(key) = std::env::var(CREDENTIAL_ENV) {
            let key = key.trim();
            if !key.is_empty() {
                self.client_credential = Some(key.to_string());
            }
        }
        self
    }
}
