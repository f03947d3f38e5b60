//! VizieR backend: catalog discovery and per-catalog queries over TAPVizieR.
//!
//! TAPVizieR has no name resolver of its own, so object names are resolved
//! through a SIMBAD identifier lookup before the cone search runs.

use async_trait::async_trait;

use sky_primitives::{ArgumentMap, ServiceValue, SkyPosition};

use crate::params::{self, PositionOrName};
use crate::simbad::{SIMBAD_TAP_SYNC, resolve_with};
use crate::tap::TapClient;
use crate::traits::{MemberSpec, ParamSpec, ServiceError, ServiceResult, ServiceTarget};

const VIZIER_TAP_SYNC: &str = "https://tapvizier.cds.unistra.fr/TAPVizieR/tap/sync";

const DEFAULT_RADIUS_DEG: f64 = 2.0 / 60.0;
const DEFAULT_MAX_CATALOGS: u64 = 50;

const QUERY_OBJECT_DOC: &str = "Query a VizieR catalog around a named object.

Parameters
----------
object_name : object whose position anchors the search
catalog : VizieR table to query, e.g. 'I/355/gaiadr3'
radius : angular search radius around the resolved position
";

const QUERY_REGION_DOC: &str = "Cone search in a VizieR catalog.

Parameters
----------
coordinates : sky position or an object name to resolve first
radius : angular search radius around the center
catalog : VizieR table to query, e.g. 'I/355/gaiadr3'
";

const FIND_CATALOGS_DOC: &str = "Search VizieR catalog descriptions by keyword.

Parameters
----------
keywords : free-text keywords matched against names and descriptions
max_catalogs : maximum number of catalogs to return
";

/// VizieR service backend.
#[derive(Debug)]
pub struct VizierService {
    tap: TapClient,
    resolver: TapClient,
}

impl VizierService {
    /// Creates a backend pointed at TAPVizieR with a SIMBAD name resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if either client cannot be
    /// built.
    pub fn new() -> ServiceResult<Self> {
        Ok(Self {
            tap: TapClient::new("vizier", VIZIER_TAP_SYNC)?,
            resolver: TapClient::new("vizier", SIMBAD_TAP_SYNC)?,
        })
    }

    async fn cone_search(
        &self,
        center: SkyPosition,
        radius_deg: f64,
        args: &ArgumentMap,
    ) -> ServiceResult<ServiceValue> {
        let Some(catalog) = params::opt_str(args, "catalog") else {
            return Err(ServiceError::invalid_parameter(
                "catalog",
                "a VizieR table name is required; use find_catalogs to discover one",
            ));
        };
        let adql = cone_adql(catalog, &center, radius_deg);
        Ok(self.tap.query(&adql, None).await?.into())
    }

    async fn query_object(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let name = params::require_str(args, "object_name")?;
        let center = resolve_with(&self.resolver, name).await?;
        let radius = params::radius_deg(args, "radius", DEFAULT_RADIUS_DEG)?;
        self.cone_search(center, radius, args).await
    }

    async fn query_region(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let center = match params::position_or_name(args, "coordinates")? {
            PositionOrName::Position(pos) => pos,
            PositionOrName::Name(name) => resolve_with(&self.resolver, &name).await?,
        };
        let radius = params::radius_deg(args, "radius", DEFAULT_RADIUS_DEG)?;
        self.cone_search(center, radius, args).await
    }

    async fn find_catalogs(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let keywords = params::require_str(args, "keywords")?;
        let limit = params::opt_u64(args, "max_catalogs").unwrap_or(DEFAULT_MAX_CATALOGS);
        let adql = catalogs_adql(keywords, limit);
        Ok(self.tap.query(&adql, Some(limit)).await?.into())
    }
}

#[async_trait]
impl ServiceTarget for VizierService {
    fn service_name(&self) -> &str {
        "vizier"
    }

    fn members(&self) -> Vec<MemberSpec> {
        vec![
            MemberSpec::new("query_object", QUERY_OBJECT_DOC)
                .param(ParamSpec::required("object_name", "str"))
                .param(ParamSpec::optional("catalog", "str", serde_json::Value::Null))
                .param(ParamSpec::optional(
                    "radius",
                    "angle",
                    serde_json::json!("2 arcmin"),
                )),
            MemberSpec::new("query_region", QUERY_REGION_DOC)
                .param(ParamSpec::required("coordinates", "coordinates"))
                .param(ParamSpec::optional(
                    "radius",
                    "angle",
                    serde_json::json!("2 arcmin"),
                ))
                .param(ParamSpec::optional("catalog", "str", serde_json::Value::Null)),
            MemberSpec::new("find_catalogs", FIND_CATALOGS_DOC)
                .param(ParamSpec::required("keywords", "str"))
                .param(ParamSpec::optional(
                    "max_catalogs",
                    "int",
                    serde_json::json!(DEFAULT_MAX_CATALOGS),
                )),
        ]
    }

    async fn invoke(&self, operation: &str, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        match operation {
            "query_object" => self.query_object(args).await,
            "query_region" => self.query_region(args).await,
            "find_catalogs" => self.find_catalogs(args).await,
            other => Err(ServiceError::unknown_operation(other)),
        }
    }
}

fn cone_adql(catalog: &str, center: &SkyPosition, radius_deg: f64) -> String {
    let table = quote_table(catalog);
    format!(
        "SELECT * FROM {table} \
         WHERE CONTAINS(POINT('ICRS', RAJ2000, DEJ2000), \
         CIRCLE('ICRS', {ra}, {dec}, {radius_deg})) = 1",
        ra = center.ra_deg(),
        dec = center.dec_deg(),
    )
}

fn catalogs_adql(keywords: &str, limit: u64) -> String {
    let needle = params::escape_adql(&keywords.to_lowercase());
    format!(
        "SELECT TOP {limit} table_name, description FROM TAP_SCHEMA.tables \
         WHERE LOWER(description) LIKE '%{needle}%' \
         OR LOWER(table_name) LIKE '%{needle}%'"
    )
}

// VizieR table names carry '/' and must be double-quoted in ADQL.
fn quote_table(catalog: &str) -> String {
    format!("\"{}\"", catalog.replace('"', ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cone_query_quotes_catalog_name() {
        let adql = cone_adql("II/246/out", &SkyPosition::new(83.63, 22.01), 0.1);
        assert!(adql.starts_with("SELECT * FROM \"II/246/out\""));
        assert!(adql.contains("CIRCLE('ICRS', 83.63, 22.01, 0.1)"));
    }

    #[test]
    fn catalog_search_lowercases_keywords() {
        let adql = catalogs_adql("Quasar Survey", 10);
        assert!(adql.contains("TOP 10"));
        assert!(adql.contains("'%quasar survey%'"));
    }

    #[test]
    fn missing_catalog_is_reported_as_invalid_parameter() {
        let service = VizierService::new().unwrap();
        let mut args = ArgumentMap::new();
        args.insert(
            "coordinates".to_owned(),
            sky_primitives::Argument::Position(SkyPosition::new(10.0, 20.0)),
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let err = runtime
            .block_on(service.invoke("query_region", &args))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidParameter { parameter, .. } if parameter == "catalog"));
    }
}
