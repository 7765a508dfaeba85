//! bdl_rs
//!
//! A small Rust library for retrieving statistical indicators per territorial
//! unit from the BDL (Local Data Bank) API and reshaping them into a wide table.
//! Pairs with the `bdl` CLI.
//!
//! ### Features
//! - Fetch variable metadata and build a normalized variable catalog
//! - Fetch per-unit observations for many variables in one call
//! - Left-join metadata and pivot long records into a wide table
//! - Save catalog, long and wide tables as CSV
//!
//! ### Example
//! ```no_run
//! use bdl_rs::{Config, IdSource, Pipeline};
//!
//! let config = Config {
//!     unit_ids: IdSource::Inline(vec!["011212001011".into()]),
//!     variable_ids: IdSource::Inline(vec!["60559".into()]),
//!     ..Config::default()
//! }
//! .with_env_credential();
//! let summary = Pipeline::from_config(config).run()?;
//! println!("{} rows", summary.table.rows.len());
//! # Ok::<(), bdl_rs::Error>(())
//! ```

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod pipeline;
pub mod rate_limit;
pub mod reshape;
pub mod storage;

pub use api::{Client, DataSource};
pub use catalog::Catalog;
pub use config::{Config, IdSource};
pub use error::{Error, Result};
pub use models::{JoinedRecord, Observation, Variable};
pub use pipeline::{Pipeline, RunSummary};
pub use reshape::{Column, PivotSpec, WideTable};
