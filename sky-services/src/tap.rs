//! Synchronous TAP (Table Access Protocol) client shared by the archive
//! backends.

use std::fmt;
use std::time::Duration;

use hyper::body::to_bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Body, Request, Uri};
use serde::Deserialize;
use tokio::time::timeout;
use tracing::debug;

use sky_primitives::{Cell, ColumnSpec, TableValue};

use crate::http_client::{HyperClient, build_https_client};
use crate::traits::{ServiceError, ServiceResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for a single TAP sync endpoint.
pub struct TapClient {
    service: String,
    endpoint: Uri,
    client: HyperClient,
    timeout: Duration,
}

impl fmt::Debug for TapClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TapClient")
            .field("service", &self.service)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl TapClient {
    /// Creates a client for the given sync endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if the endpoint is not a
    /// valid URI.
    pub fn new(service: impl Into<String>, endpoint: &str) -> ServiceResult<Self> {
        let service = service.into();
        let endpoint = endpoint
            .parse::<Uri>()
            .map_err(|err| ServiceError::configuration(format!("invalid TAP endpoint: {err}")))?;
        let client = build_https_client()?;

        Ok(Self {
            service,
            endpoint,
            client,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Runs an ADQL query synchronously and decodes the result table.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Timeout`], [`ServiceError::Transport`],
    /// [`ServiceError::Status`], [`ServiceError::Auth`], or
    /// [`ServiceError::Decode`] depending on where the request failed.
    pub async fn query(&self, adql: &str, max_rows: Option<u64>) -> ServiceResult<TableValue> {
        debug!(service = %self.service, query = %adql, "submitting TAP query");

        let mut form = String::from("REQUEST=doQuery&LANG=ADQL&FORMAT=json");
        if let Some(limit) = max_rows {
            form.push_str(&format!("&MAXREC={limit}"));
        }
        form.push_str("&QUERY=");
        form.push_str(&urlencoding::encode(adql));

        let request = Request::post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .map_err(|err| {
                ServiceError::transport(&self.service, format!("failed to build request: {err}"))
            })?;

        let response = timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| ServiceError::Timeout {
                service: self.service.clone(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|err| {
                ServiceError::transport(&self.service, format!("request failed: {err}"))
            })?;

        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.map_err(|err| {
            ServiceError::transport(&self.service, format!("failed to read response: {err}"))
        })?;

        if !status.is_success() {
            let reason = String::from_utf8_lossy(&bytes).to_string();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ServiceError::Auth {
                    service: self.service.clone(),
                    reason,
                });
            }
            return Err(ServiceError::Status {
                service: self.service.clone(),
                status: status.as_u16(),
                reason,
            });
        }

        let parsed: TapResponse = serde_json::from_slice(&bytes)
            .map_err(|err| ServiceError::decode(&self.service, err.to_string()))?;

        parsed.into_table(&self.service)
    }
}

/// Wire format of a TAP `FORMAT=json` response.
#[derive(Debug, Deserialize)]
pub(crate) struct TapResponse {
    #[serde(default)]
    metadata: Vec<TapColumn>,
    #[serde(default)]
    data: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TapColumn {
    name: String,
    #[serde(default)]
    datatype: Option<String>,
    #[serde(default)]
    unit: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl TapResponse {
    pub(crate) fn into_table(self, service: &str) -> ServiceResult<TableValue> {
        let columns: Vec<ColumnSpec> = self
            .metadata
            .iter()
            .map(|col| {
                let mut spec = ColumnSpec::new(col.name.clone());
                if let Some(datatype) = &col.datatype {
                    spec = spec.with_dtype(datatype.clone());
                }
                if let Some(unit) = &col.unit {
                    spec = spec.with_unit(unit.clone());
                }
                if let Some(description) = &col.description {
                    spec = spec.with_description(description.clone());
                }
                spec
            })
            .collect();

        let width = columns.len();
        let mut table = TableValue::new(columns);
        for (index, row) in self.data.into_iter().enumerate() {
            if row.len() != width {
                return Err(ServiceError::decode(
                    service,
                    format!("row {index} has {} cells, expected {width}", row.len()),
                ));
            }
            table.push_row(row.into_iter().map(json_cell).collect());
        }

        Ok(table)
    }
}

fn json_cell(value: serde_json::Value) -> Cell {
    match value {
        serde_json::Value::Null => Cell::Null,
        serde_json::Value::Bool(b) => Cell::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Int(i)
            } else {
                n.as_f64().map_or(Cell::Null, Cell::Float)
            }
        }
        serde_json::Value::String(s) => Cell::Text(s),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_json_decodes_into_table() {
        let json = r#"{
            "metadata": [
                { "name": "main_id", "datatype": "char", "description": "Main identifier" },
                { "name": "ra", "datatype": "double", "unit": "deg" },
                { "name": "dec", "datatype": "double", "unit": "deg" }
            ],
            "data": [
                ["M  31", 10.684708, 41.26875],
                ["M  33", 23.462100, 30.66017]
            ]
        }"#;

        let parsed: TapResponse = serde_json::from_str(json).unwrap();
        let table = parsed.into_table("simbad").unwrap();
        assert_eq!(table.column_names(), vec!["main_id", "ra", "dec"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, "main_id"), Some(&Cell::Text("M  31".to_owned())));
        assert_eq!(table.cell(1, "dec"), Some(&Cell::Float(30.66017)));
    }

    #[test]
    fn ragged_tap_rows_are_rejected() {
        let json = r#"{
            "metadata": [{ "name": "ra" }, { "name": "dec" }],
            "data": [[1.0]]
        }"#;

        let parsed: TapResponse = serde_json::from_str(json).unwrap();
        let err = parsed.into_table("vizier").unwrap_err();
        assert!(matches!(err, ServiceError::Decode { .. }));
    }

    #[test]
    fn invalid_endpoint_is_a_configuration_error() {
        let err = TapClient::new("simbad", "not a uri").unwrap_err();
        assert!(matches!(err, ServiceError::Configuration { .. }));
    }
}
