use anyhow::{Context, Result};
use bdl_rs::config::{
    CREDENTIAL_ENV, DEFAULT_BASE_URL, DEFAULT_CATALOG_PATH, DEFAULT_OUTPUT_PATH,
    DEFAULT_UNITS_FILE, DEFAULT_VARIABLES_FILE,
};
use bdl_rs::{Config, IdSource, Pipeline, PivotSpec};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "bdl",
    version,
    about = "Fetch BDL indicators per territorial unit and export a wide CSV table"
)]
struct Cli {
    /// Newline-delimited list of territorial unit ids.
    #[arg(long, default_value = DEFAULT_UNITS_FILE)]
    units: PathBuf,
    /// Newline-delimited list of variable ids.
    #[arg(long, default_value = DEFAULT_VARIABLES_FILE)]
    variables: PathBuf,
    /// Year filter for unit data, comma separated (e.g., 2022,2023). All years if omitted.
    #[arg(long, value_delimiter = ',')]
    year: Vec<i32>,
    /// Where to write the variable catalog.
    #[arg(long, default_value = DEFAULT_CATALOG_PATH)]
    catalog_out: PathBuf,
    /// Where to write the wide table.
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    out: PathBuf,
    /// Also write the joined long-format records here.
    #[arg(long)]
    long_out: Option<PathBuf>,
    /// Table layout.
    #[arg(long, value_enum, default_value_t = Layout::UnitYear)]
    layout: Layout,
    /// Pause after every API call, in milliseconds.
    #[arg(long, default_value_t = 500)]
    delay_ms: u64,
    /// API base URL.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Metadata language.
    #[arg(long, default_value = "pl")]
    lang: String,
    /// Client id sent as X-ClientId.
    #[arg(long, env = CREDENTIAL_ENV, hide_env_values = true)]
    client_id: Option<String>,
    /// Do not prefix the wide CSV with a UTF-8 byte-order mark.
    #[arg(long, default_value_t = false)]
    no_bom: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Layout {
    /// One row per unit and year, one column per variable label.
    UnitYear,
    /// One row per unit, one column per variable label (use with a single --year).
    VariableLabel,
    /// One row per unit, one column per year.
    Year,
    /// One row per unit and variable, one column per year.
    VariableYear,
}

impl From<Layout> for PivotSpec {
    fn from(l: Layout) -> Self {
        match l {
            Layout::UnitYear => PivotSpec::by_unit_year(),
            Layout::VariableLabel => PivotSpec::by_variable_label(),
            Layout::Year => PivotSpec::by_year(),
            Layout::VariableYear => PivotSpec::by_variable_year(),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = Config {
        api_base_url: cli.base_url,
        client_credential: cli.client_id.filter(|s| !s.trim().is_empty()),
        unit_ids: IdSource::File(cli.units),
        variable_ids: IdSource::File(cli.variables),
        rate_limit_delay: Duration::from_millis(cli.delay_ms),
        lang: cli.lang,
        years: cli.year,
        catalog_path: cli.catalog_out,
        output_path: cli.out,
        long_output_path: cli.long_out,
        write_bom: !cli.no_bom,
        pivot: cli.layout.into(),
        ..Config::default()
    };
    if config.client_credential.is_none() {
        log::warn!("{} not set; using anonymous API limits", CREDENTIAL_ENV);
    }

    let output = config.output_path.clone();
    let summary = Pipeline::from_config(config)
        .run()
        .context("pipeline run failed")?;
    eprintln!(
        "Saved {} rows ({} observations, {} variables) to {}",
        summary.table.rows.len(),
        summary.observations,
        summary.catalog.len(),
        output.display()
    );
    Ok(())
}
