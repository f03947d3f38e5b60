//! NED backend: extragalactic object lookup and cone search over the NED
//! TAP service.

use async_trait::async_trait;

use sky_primitives::{ArgumentMap, ServiceValue, SkyPosition};

use crate::params::{self, PositionOrName};
use crate::simbad;
use crate::tap::TapClient;
use crate::traits::{MemberSpec, ParamSpec, ServiceError, ServiceResult, ServiceTarget};

const NED_TAP_SYNC: &str = "https://ned.ipac.caltech.edu/tap/sync";

const DEFAULT_RADIUS_DEG: f64 = 2.0 / 60.0;

const QUERY_OBJECT_DOC: &str = "Query NED for a single extragalactic object.

Parameters
----------
object_name : preferred or aliased NED name, e.g. 'NGC 224'
";

const QUERY_REGION_DOC: &str = "Cone search of the NED object directory.

Parameters
----------
coordinates : sky position or an object name to resolve first
radius : angular search radius around the center
";

/// NED service backend.
#[derive(Debug)]
pub struct NedService {
    tap: TapClient,
}

impl NedService {
    /// Creates a backend pointed at the NED TAP service.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if the client cannot be built.
    pub fn new() -> ServiceResult<Self> {
        Ok(Self {
            tap: TapClient::new("ned", NED_TAP_SYNC)?,
        })
    }

    async fn query_object(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let name = params::require_str(args, "object_name")?;
        let adql = object_adql(name);
        Ok(self.tap.query(&adql, None).await?.into())
    }

    async fn query_region(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let center = match params::position_or_name(args, "coordinates")? {
            PositionOrName::Position(pos) => pos,
            PositionOrName::Name(name) => self.resolve(&name).await?,
        };
        let radius = params::radius_deg(args, "radius", DEFAULT_RADIUS_DEG)?;
        let adql = region_adql(&center, radius);
        Ok(self.tap.query(&adql, None).await?.into())
    }

    // NED resolves names itself through its object directory.
    async fn resolve(&self, name: &str) -> ServiceResult<SkyPosition> {
        let table = self.tap.query(&object_adql(name), Some(1)).await?;
        position_from(&table).ok_or_else(|| {
            ServiceError::invalid_parameter(
                "coordinates",
                format!("object `{name}` could not be resolved to a position"),
            )
        })
    }
}

#[async_trait]
impl ServiceTarget for NedService {
    fn service_name(&self) -> &str {
        "ned"
    }

    fn members(&self) -> Vec<MemberSpec> {
        vec![
            MemberSpec::new("query_object", QUERY_OBJECT_DOC)
                .param(ParamSpec::required("object_name", "str")),
            MemberSpec::new("query_region", QUERY_REGION_DOC)
                .param(ParamSpec::required("coordinates", "coordinates"))
                .param(ParamSpec::optional(
                    "radius",
                    "angle",
                    serde_json::json!("2 arcmin"),
                )),
        ]
    }

    async fn invoke(&self, operation: &str, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        match operation {
            "query_object" => self.query_object(args).await,
            "query_region" => self.query_region(args).await,
            other => Err(ServiceError::unknown_operation(other)),
        }
    }
}

fn position_from(table: &sky_primitives::TableValue) -> Option<SkyPosition> {
    let ra = table.cell(0, "ra").and_then(simbad::cell_f64)?;
    let dec = table.cell(0, "dec").and_then(simbad::cell_f64)?;
    Some(SkyPosition::new(ra, dec))
}

fn object_adql(name: &str) -> String {
    let escaped = params::escape_adql(name);
    format!(
        "SELECT prefname, ra, dec, objtype, z FROM NEDTAP.objdir \
         WHERE prefname = '{escaped}'"
    )
}

fn region_adql(center: &SkyPosition, radius_deg: f64) -> String {
    format!(
        "SELECT prefname, ra, dec, objtype, z FROM NEDTAP.objdir \
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
    fn object_query_targets_the_object_directory() {
        let adql = object_adql("NGC 224");
        assert!(adql.contains("FROM NEDTAP.objdir"));
        assert!(adql.contains("prefname = 'NGC 224'"));
    }

    #[test]
    fn region_query_embeds_radius_in_degrees() {
        let adql = region_adql(&SkyPosition::new(10.68, 41.27), 0.05);
        assert!(adql.contains("CIRCLE('ICRS', 10.68, 41.27, 0.05)"));
    }

    #[test]
    fn resolution_accepts_integer_valued_coordinates() {
        use sky_primitives::{Cell, ColumnSpec, TableValue};

        let mut table = TableValue::new(vec![
            ColumnSpec::new("prefname"),
            ColumnSpec::new("ra"),
            ColumnSpec::new("dec"),
        ]);
        table.push_row(vec![
            Cell::Text("NGC 224".into()),
            Cell::Int(10),
            Cell::Float(41.27),
        ]);

        let position = position_from(&table).expect("integer ra should resolve");
        assert!((position.ra_deg() - 10.0).abs() < f64::EPSILON);
        assert!((position.dec_deg() - 41.27).abs() < f64::EPSILON);
    }
}
