//! ADS backend: literature search against the bearer-token JSON API.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::header::AUTHORIZATION;
use hyper::{Body, Request, Uri};
use serde::Deserialize;
use tokio::time::timeout;
use tracing::debug;

use sky_primitives::{ArgumentMap, Cell, ColumnSpec, ServiceValue, TableValue};

use crate::http_client::{HyperClient, build_https_client};
use crate::params;
use crate::traits::{MemberSpec, ParamSpec, ServiceError, ServiceResult, ServiceTarget};

const ADS_SEARCH_URL: &str = "https://api.adsabs.harvard.edu/v1/search/query";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_ROWS: u64 = 50;

const QUERY_SIMPLE_DOC: &str = "Search the ADS literature database.

Parameters
----------
query : ADS query string, e.g. 'author:\"Penzias\" year:1965'
rows : maximum number of records to return
start : offset of the first record, for paging
";

const FETCH_ABSTRACT_DOC: &str = "Fetch the abstract of a single publication.

Parameters
----------
bibcode : ADS bibcode of the publication, e.g. '1965ApJ...142..419P'
";

/// ADS service backend.
pub struct AdsService {
    client: HyperClient,
    endpoint: String,
    token: String,
    timeout: Duration,
}

impl fmt::Debug for AdsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdsService")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AdsService {
    /// Creates a backend holding the supplied API token.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if the token is empty or the
    /// client cannot be built.
    pub fn new(token: impl Into<String>) -> ServiceResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ServiceError::configuration("ADS requires a non-empty API token"));
        }
        Ok(Self {
            client: build_https_client()?,
            endpoint: ADS_SEARCH_URL.to_owned(),
            token,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn search(&self, query: &str, fields: &str, rows: u64, start: u64) -> ServiceResult<AdsResponse> {
        debug!(query = %query, rows, start, "submitting ADS search");

        let url = format!(
            "{}?q={}&fl={}&rows={rows}&start={start}",
            self.endpoint,
            urlencoding::encode(query),
            fields,
        );
        let uri = url
            .parse::<Uri>()
            .map_err(|err| ServiceError::configuration(format!("invalid ADS URL: {err}")))?;

        let request = Request::get(uri)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .body(Body::empty())
            .map_err(|err| {
                ServiceError::transport("ads", format!("failed to build request: {err}"))
            })?;

        let response = timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| ServiceError::Timeout {
                service: "ads".to_owned(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|err| ServiceError::transport("ads", format!("request failed: {err}")))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.map_err(|err| {
            ServiceError::transport("ads", format!("failed to read response: {err}"))
        })?;

        if !status.is_success() {
            let reason = String::from_utf8_lossy(&bytes).to_string();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ServiceError::Auth {
                    service: "ads".to_owned(),
                    reason,
                });
            }
            return Err(ServiceError::Status {
                service: "ads".to_owned(),
                status: status.as_u16(),
                reason,
            });
        }

        serde_json::from_slice(&bytes).map_err(|err| ServiceError::decode("ads", err.to_string()))
    }

    async fn query_simple(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let query = params::require_str(args, "query")?;
        let rows = params::opt_u64(args, "rows").unwrap_or(DEFAULT_ROWS);
        let start = params::opt_u64(args, "start").unwrap_or(0);
        let parsed = self
            .search(query, "bibcode,title,author,year", rows, start)
            .await?;
        Ok(docs_table(parsed.response.docs).into())
    }

    async fn fetch_abstract(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let bibcode = params::require_str(args, "bibcode")?;
        let query = format!("bibcode:{bibcode}");
        let parsed = self
            .search(&query, "bibcode,title,abstract", 1, 0)
            .await?;
        let Some(doc) = parsed.response.docs.into_iter().next() else {
            return Err(ServiceError::invalid_parameter(
                "bibcode",
                format!("no publication matches bibcode `{bibcode}`"),
            ));
        };
        Ok(ServiceValue::Record(vec![
            (
                "bibcode".to_owned(),
                doc.bibcode.map_or(ServiceValue::Null, ServiceValue::Text),
            ),
            ("title".to_owned(), join_text(doc.title)),
            (
                "abstract".to_owned(),
                doc.abstract_text.map_or(ServiceValue::Null, ServiceValue::Text),
            ),
        ]))
    }
}

#[async_trait]
impl ServiceTarget for AdsService {
    fn service_name(&self) -> &str {
        "ads"
    }

    fn members(&self) -> Vec<MemberSpec> {
        vec![
            MemberSpec::new("query_simple", QUERY_SIMPLE_DOC)
                .param(ParamSpec::required("query", "str"))
                .param(ParamSpec::optional(
                    "rows",
                    "int",
                    serde_json::json!(DEFAULT_ROWS),
                ))
                .param(ParamSpec::optional("start", "int", serde_json::json!(0))),
            MemberSpec::new("fetch_abstract", FETCH_ABSTRACT_DOC)
                .param(ParamSpec::required("bibcode", "str")),
        ]
    }

    async fn invoke(&self, operation: &str, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        match operation {
            "query_simple" => self.query_simple(args).await,
            "fetch_abstract" => self.fetch_abstract(args).await,
            other => Err(ServiceError::unknown_operation(other)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AdsResponse {
    response: AdsDocs,
}

#[derive(Debug, Deserialize)]
struct AdsDocs {
    #[serde(default)]
    docs: Vec<AdsDoc>,
}

#[derive(Debug, Deserialize)]
struct AdsDoc {
    #[serde(default)]
    bibcode: Option<String>,
    // ADS reports titles and authors as arrays.
    #[serde(default)]
    title: Option<Vec<String>>,
    #[serde(default)]
    author: Option<Vec<String>>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default, rename = "abstract")]
    abstract_text: Option<String>,
}

fn docs_table(docs: Vec<AdsDoc>) -> TableValue {
    let mut table = TableValue::new(vec![
        ColumnSpec::new("bibcode"),
        ColumnSpec::new("title"),
        ColumnSpec::new("author"),
        ColumnSpec::new("year"),
    ]);
    for doc in docs {
        table.push_row(vec![
            doc.bibcode.map_or(Cell::Null, Cell::Text),
            join_cell(doc.title),
            join_cell(doc.author),
            doc.year.map_or(Cell::Null, Cell::Text),
        ]);
    }
    table
}

fn join_cell(items: Option<Vec<String>>) -> Cell {
    items.map_or(Cell::Null, |items| Cell::Text(items.join("; ")))
}

fn join_text(items: Option<Vec<String>>) -> ServiceValue {
    items.map_or(ServiceValue::Null, |items| {
        ServiceValue::Text(items.join("; "))
    })
}
