//! Error taxonomy for the fetch → join → pivot → export pipeline.
//!
//! Every variant is fatal: the pipeline aborts on the first error and the
//! operator re-runs after fixing the cause.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The API answered with a non-success status code.
    #[error("GET {url} failed with HTTP {status}")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },

    /// The request never produced a usable response (network failure or an
    /// undecodable body).
    #[error("GET {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A payload was structurally valid JSON but unusable, e.g. a variable
    /// without any name level.
    #[error("parse error: {0}")]
    Parse(String),

    /// Two records map onto the same (index, category) cell of a pivot.
    #[error("duplicate pivot key: index {index:?}, category {category:?}")]
    Integrity {
        index: Vec<Option<String>>,
        category: String,
    },

    /// A record has no value for the pivot's category column, so no column can hold it.
    #[error("missing {column} for pivot row {index:?}")]
    MissingCategory {
        column: String,
        index: Vec<Option<String>>,
    },

    /// Pagination did not terminate within the page cap.
    #[error("GET {url}: page limit exceeded ({pages})")]
    PageLimit { url: String, pages: u32 },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    /// True for the transport class: HTTP status failures, network errors and
    /// runaway pagination.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Http { .. } | Error::Transport { .. } | Error::PageLimit { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
