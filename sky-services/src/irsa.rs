//! IRSA backend: infrared archive cone searches over the IRSA TAP service.

use async_trait::async_trait;

use sky_primitives::{ArgumentMap, ServiceValue, SkyPosition};

use crate::params::{self, PositionOrName};
use crate::simbad::{SIMBAD_TAP_SYNC, resolve_with};
use crate::tap::TapClient;
use crate::traits::{MemberSpec, ParamSpec, ServiceError, ServiceResult, ServiceTarget};

const IRSA_TAP_SYNC: &str = "https://irsa.ipac.caltech.edu/TAP/sync";

const DEFAULT_RADIUS_DEG: f64 = 10.0 / 3600.0;

const QUERY_REGION_DOC: &str = "Cone search of an IRSA catalog.

Parameters
----------
coordinates : sky position or an object name to resolve first
catalog : IRSA table to query, e.g. 'allwise_p3as_psd' or 'fp_psc'
radius : angular search radius around the center
";

/// IRSA service backend.
#[derive(Debug)]
pub struct IrsaService {
    tap: TapClient,
    resolver: TapClient,
}

impl IrsaService {
    /// Creates a backend pointed at the IRSA TAP service with a SIMBAD name
    /// resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if either client cannot be
    /// built.
    pub fn new() -> ServiceResult<Self> {
        Ok(Self {
            tap: TapClient::new("irsa", IRSA_TAP_SYNC)?,
            resolver: TapClient::new("irsa", SIMBAD_TAP_SYNC)?,
        })
    }

    async fn query_region(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let catalog = params::require_str(args, "catalog")?;
        let center = match params::position_or_name(args, "coordinates")? {
            PositionOrName::Position(pos) => pos,
            PositionOrName::Name(name) => resolve_with(&self.resolver, &name).await?,
        };
        let radius = params::radius_deg(args, "radius", DEFAULT_RADIUS_DEG)?;
        let adql = region_adql(catalog, &center, radius);
        Ok(self.tap.query(&adql, None).await?.into())
    }
}

#[async_trait]
impl ServiceTarget for IrsaService {
    fn service_name(&self) -> &str {
        "irsa"
    }

    fn members(&self) -> Vec<MemberSpec> {
        vec![
            MemberSpec::new("query_region", QUERY_REGION_DOC)
                .param(ParamSpec::required("coordinates", "coordinates"))
                .param(ParamSpec::required("catalog", "str"))
                .param(ParamSpec::optional(
                    "radius",
                    "angle",
                    serde_json::json!("10 arcsec"),
                )),
        ]
    }

    async fn invoke(&self, operation: &str, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        match operation {
            "query_region" => self.query_region(args).await,
            other => Err(ServiceError::unknown_operation(other)),
        }
    }
}

fn region_adql(catalog: &str, center: &SkyPosition, radius_deg: f64) -> String {
    let table: String = catalog
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    format!(
        "SELECT * FROM {table} \
         WHERE CONTAINS(POINT('ICRS', ra, dec), \
         CIRCLE('ICRS', {ra}, {dec}, {radius_deg})) = 1",
        ra = center.ra_deg(),
        dec = center.dec_deg(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_query_targets_requested_catalog() {
        let adql = region_adql("fp_psc", &SkyPosition::new(280.46, -60.0), 10.0 / 3600.0);
        assert!(adql.contains("FROM fp_psc"));
        assert!(adql.contains("280.46, -60,"));
    }
}
