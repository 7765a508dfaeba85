/// Synchronous client for the **BDL (Bank Danych Lokalnych) API v1**.
///
/// This module covers the two endpoints the pipeline needs:
/// - `variables/{id}`: variable metadata (name levels, measure unit, subject)
/// - `data/by-unit/{id}`: all requested series for one territorial unit
///
/// ### Notes
/// - Identifiers come back as JSON numbers on some endpoints and strings on others;
///   both are normalized to `String`.
/// - Unit data is paginated; pages are followed while the response advertises `links.next`.
/// - Every GET is followed by the configured rate-limit pause. There is no retry: any
///   non-success status or network failure is returned as an error immediately.
///
/// Typical usage:
/// ```no_run
/// # use bdl_rs::Client;
/// let client = Client::default();
/// let var = client.fetch_variable("60559")?;
/// let rows = client.fetch_unit_data("011212001011", &[var.variable_id], &[2023])?;
/// # Ok::<(), bdl_rs::Error>(())
/// ```
use crate::catalog::parse_variable;
use crate::config::{Config, DEFAULT_BASE_URL};
use crate::error::{Error, Result};
use crate::models::{Observation, UnitData, Variable, VariableMeta};
use crate::rate_limit::{FixedDelay, RateLimiter};
use log::debug;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Header carrying the registered client identifier.
pub const CLIENT_ID_HEADER: &str = "X-ClientId";

/// Safety cap to avoid pathological jobs
pub const MAX_PAGES: u32 = 1000;

/// Remote operations the pipeline depends on.
///
/// [`Client`] talks to the live API; tests substitute an in-memory source.
pub trait DataSource {
    /// Raw metadata for one variable.
    fn variable_meta(&self, variable_id: &str) -> Result<VariableMeta>;

    /// All observations for one unit across the requested variables.
    ///
    /// Variables missing from the response simply produce no rows.
    fn unit_observations(
        &self,
        unit_id: &str,
        variable_ids: &[String],
        years: &[i32],
    ) -> Result<Vec<Observation>>;
}

#[derive(Debug, Clone)]
pub struct Client {
    pub base_url: String,
    pub lang: String,
    pub page_size: u32,
    /// Pages followed per unit before giving up.
    pub max_pages: u32,
    credential: Option<String>,
    limiter: Arc<dyn RateLimiter>,
    http: HttpClient,
}

fn http_client() -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(30)) // total request timeout
        .connect_timeout(Duration::from_secs(10)) // connect timeout
        .redirect(Policy::limited(5)) // cap redirects
        .user_agent(concat!("bdl_rs/", env!("CARGO_PKG_VERSION"))) // set user agent
        .build()
        .expect("reqwest client build")
}

impl Default for Client {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            lang: "pl".into(),
            page_size: 100,
            max_pages: MAX_PAGES,
            credential: None,
            limiter: Arc::new(FixedDelay::default()),
            http: http_client(),
        }
    }
}

impl Client {
    /// Build a client from the pipeline configuration (base url, credential, pacing, language).
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            lang: config.lang.clone(),
            page_size: config.page_size.max(1),
            max_pages: MAX_PAGES,
            credential: config.client_credential.clone(),
            limiter: Arc::new(FixedDelay(config.rate_limit_delay)),
            http: http_client(),
        }
    }

    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    /// Swap the pacing strategy applied after every call.
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// URL of the metadata endpoint for one variable.
    pub fn variable_url(&self, variable_id: &str) -> String {
        format!(
            "{}/variables/{}?format=json&lang={}",
            self.base_url,
            enc(variable_id),
            enc(&self.lang)
        )
    }

    /// URL of one page of the unit-data endpoint. `var-id` and `year` are repeated per value.
    pub fn unit_data_url(
        &self,
        unit_id: &str,
        variable_ids: &[String],
        years: &[i32],
        page: u32,
    ) -> String {
        let mut url = format!("{}/data/by-unit/{}?format=json", self.base_url, enc(unit_id));
        for id in variable_ids {
            url.push_str(&format!("&var-id={}", enc(id)));
        }
        for y in years {
            url.push_str(&format!("&year={}", y));
        }
        url.push_str(&format!("&page-size={}&page={}", self.page_size, page));
        url
    }

    /// Fetch and normalize one variable's metadata.
    ///
    /// ### Errors
    /// - `Http` / `Transport` when the call fails
    /// - `Parse` when the variable has no name level
    pub fn fetch_variable(&self, variable_id: &str) -> Result<Variable> {
        parse_variable(self.variable_meta(variable_id)?)
    }

    /// Fetch observations for one territorial unit.
    ///
    /// - `variable_ids`: sent as one repeated `var-id` parameter.
    /// - `years`: optional filter; empty means every year the API has.
    pub fn fetch_unit_data(
        &self,
        unit_id: &str,
        variable_ids: &[String],
        years: &[i32],
    ) -> Result<Vec<Observation>> {
        let mut out = Vec::new();
        let mut page = 0u32;
        loop {
            let url = self.unit_data_url(unit_id, variable_ids, years, page);
            if page >= self.max_pages {
                return Err(Error::PageLimit {
                    url,
                    pages: self.max_pages,
                });
            }
            let data: UnitData = self.get_json(&url)?;
            let more = data.has_next_page();
            out.extend(data.into_observations());
            if !more {
                break;
            }
            page += 1;
        }
        Ok(out)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);
        let mut req = self.http.get(url);
        if let Some(key) = self.credential.as_deref() {
            req = req.header(CLIENT_ID_HEADER, key);
        }
        let sent = req.send();
        // The pause applies to every call that reached the server or failed on the way.
        self.limiter.after_call();

        let resp = sent.map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Http {
                url: url.to_string(),
                status,
            });
        }
        resp.json::<T>().map_err(|source| Error::Transport {
            url: url.to_string(),
            source,
        })
    }
}

impl DataSource for Client {
    fn variable_meta(&self, variable_id: &str) -> Result<VariableMeta> {
        self.get_json(&self.variable_url(variable_id))
    }

    fn unit_observations(
        &self,
        unit_id: &str,
        variable_ids: &[String],
        years: &[i32],
    ) -> Result<Vec<Observation>> {
        self.fetch_unit_data(unit_id, variable_ids, years)
    }
}

// Allow -, _, . unescaped in identifiers
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

fn enc(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s.trim(), SAFE).to_string()
}
