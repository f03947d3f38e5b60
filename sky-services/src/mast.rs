//! MAST backend: observation search over the CAOM TAP service.
//!
//! Product listing and download URLs live behind the MAST Portal invoke
//! API rather than TAP, so this backend covers the observation queries
//! only.

use async_trait::async_trait;

use sky_primitives::{ArgumentMap, ServiceValue, SkyPosition};

use crate::params::{self, PositionOrName};
use crate::simbad::{SIMBAD_TAP_SYNC, resolve_with};
use crate::tap::TapClient;
use crate::traits::{MemberSpec, ParamSpec, ServiceError, ServiceResult, ServiceTarget};

const MAST_TAP_SYNC: &str = "https://mast.stsci.edu/vo-tap/api/v0.1/caom/sync";

const DEFAULT_RADIUS_DEG: f64 = 0.2;

const OBSERVATION_COLUMNS: &str = "obs_id, obs_collection, instrument_name, target_name, \
     s_ra, s_dec, t_min, t_max, dataproduct_type, calib_level, proposal_pi";

const QUERY_REGION_DOC: &str = "Cone search of MAST observations.

Parameters
----------
coordinates : sky position or an object name to resolve first
radius : angular search radius around the center
";

const QUERY_CRITERIA_DOC: &str = "Search MAST observations by metadata criteria.

Parameters
----------
obs_collection : mission collection, e.g. 'HST' or 'JWST'
instrument_name : instrument that took the observation
proposal_pi : principal investigator of the proposal
target_name : target name as recorded in the observation
";

/// MAST service backend.
#[derive(Debug)]
pub struct MastService {
    tap: TapClient,
    resolver: TapClient,
}

impl MastService {
    /// Creates a backend pointed at the CAOM TAP service with a SIMBAD
    /// name resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if either client cannot be
    /// built.
    pub fn new() -> ServiceResult<Self> {
        Ok(Self {
            tap: TapClient::new("mast", MAST_TAP_SYNC)?,
            resolver: TapClient::new("mast", SIMBAD_TAP_SYNC)?,
        })
    }

    async fn query_region(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let center = match params::position_or_name(args, "coordinates")? {
            PositionOrName::Position(pos) => pos,
            PositionOrName::Name(name) => resolve_with(&self.resolver, &name).await?,
        };
        let radius = params::radius_deg(args, "radius", DEFAULT_RADIUS_DEG)?;
        let adql = region_adql(&center, radius);
        Ok(self.tap.query(&adql, None).await?.into())
    }

    async fn query_criteria(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let criteria: Vec<(&str, &str)> = CRITERIA_PARAMS
            .iter()
            .copied()
            .filter_map(|name| params::opt_str(args, name).map(|value| (name, value)))
            .collect();
        if criteria.is_empty() {
            return Err(ServiceError::invalid_parameter(
                "obs_collection",
                "at least one search criterion is required",
            ));
        }
        let adql = criteria_adql(&criteria);
        Ok(self.tap.query(&adql, None).await?.into())
    }
}

const CRITERIA_PARAMS: &[&str] = &[
    "obs_collection",
    "instrument_name",
    "proposal_pi",
    "target_name",
];

#[async_trait]
impl ServiceTarget for MastService {
    fn service_name(&self) -> &str {
        "mast"
    }

    fn members(&self) -> Vec<MemberSpec> {
        let mut criteria = MemberSpec::new("query_criteria", QUERY_CRITERIA_DOC);
        for name in CRITERIA_PARAMS.iter().copied() {
            criteria = criteria.param(ParamSpec::optional(name, "str", serde_json::Value::Null));
        }
        vec![
            criteria,
            MemberSpec::new("query_region", QUERY_REGION_DOC)
                .param(ParamSpec::required("coordinates", "coordinates"))
                .param(ParamSpec::optional(
                    "radius",
                    "angle",
                    serde_json::json!("0.2 deg"),
                )),
        ]
    }

    async fn invoke(&self, operation: &str, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        match operation {
            "query_region" => self.query_region(args).await,
            "query_criteria" => self.query_criteria(args).await,
            other => Err(ServiceError::unknown_operation(other)),
        }
    }
}

fn region_adql(center: &SkyPosition, radius_deg: f64) -> String {
    format!(
        "SELECT {OBSERVATION_COLUMNS} FROM dbo.ObsPointing \
         WHERE CONTAINS(POINT('ICRS', s_ra, s_dec), \
         CIRCLE('ICRS', {ra}, {dec}, {radius_deg})) = 1",
        ra = center.ra_deg(),
        dec = center.dec_deg(),
    )
}

fn criteria_adql(criteria: &[(&str, &str)]) -> String {
    let clauses: Vec<String> = criteria
        .iter()
        .map(|(name, value)| format!("{name} = '{}'", params::escape_adql(value)))
        .collect();
    format!(
        "SELECT {OBSERVATION_COLUMNS} FROM dbo.ObsPointing WHERE {}",
        clauses.join(" AND ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_query_uses_observation_pointing_columns() {
        let adql = region_adql(&SkyPosition::new(210.8, 54.35), 0.2);
        assert!(adql.contains("FROM dbo.ObsPointing"));
        assert!(adql.contains("CIRCLE('ICRS', 210.8, 54.35, 0.2)"));
    }

    #[test]
    fn criteria_query_joins_clauses_and_escapes_values() {
        let adql = criteria_adql(&[
            ("obs_collection", "JWST"),
            ("proposal_pi", "O'Neil"),
        ]);
        assert!(adql.contains("obs_collection = 'JWST' AND proposal_pi = 'O''Neil'"));
    }

    #[tokio::test]
    async fn criteria_query_requires_at_least_one_criterion() {
        let service = MastService::new().unwrap();
        let err = service
            .invoke("query_criteria", &ArgumentMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidParameter { .. }));
    }
}
