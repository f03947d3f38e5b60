//! SIMBAD backend: object lookup, identifier listing, and cone search over
//! the CDS TAP service.

use async_trait::async_trait;

use sky_primitives::{ArgumentMap, ServiceValue, SkyPosition};

use crate::params::{self, PositionOrName};
use crate::tap::TapClient;
use crate::traits::{MemberSpec, ParamSpec, ServiceError, ServiceResult, ServiceTarget};

/// Synchronous TAP endpoint of the CDS SIMBAD mirror.
pub(crate) const SIMBAD_TAP_SYNC: &str = "https://simbad.cds.unistra.fr/simbad/sim-tap/sync";

const DEFAULT_RADIUS_DEG: f64 = 2.0 / 60.0;

const QUERY_OBJECT_DOC: &str = "Query SIMBAD for a single astronomical object.

Parameters
----------
object_name : identifier of the object, e.g. 'M 31' or 'HD 189733'
wildcard : treat the identifier as a wildcard pattern ('*' matches any run)
";

const QUERY_OBJECTIDS_DOC: &str = "List every identifier SIMBAD knows for an object.

Parameters
----------
object_name : any known identifier of the object
";

const QUERY_REGION_DOC: &str = "Cone search around a position or named object.

Parameters
----------
coordinates : sky position or an object name to resolve first
radius : angular search radius around the center
";

/// SIMBAD service backend.
#[derive(Debug)]
pub struct SimbadService {
    tap: TapClient,
}

impl SimbadService {
    /// Creates a backend pointed at the CDS SIMBAD TAP mirror.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if the client cannot be built.
    pub fn new() -> ServiceResult<Self> {
        Ok(Self {
            tap: TapClient::new("simbad", SIMBAD_TAP_SYNC)?,
        })
    }

    async fn query_object(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let name = params::require_str(args, "object_name")?;
        let wildcard = params::opt_bool(args, "wildcard").unwrap_or(false);
        let adql = object_adql(name, wildcard);
        Ok(self.tap.query(&adql, None).await?.into())
    }

    async fn query_objectids(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let name = params::require_str(args, "object_name")?;
        let adql = objectids_adql(name);
        Ok(self.tap.query(&adql, None).await?.into())
    }

    async fn query_region(&self, args: &ArgumentMap) -> ServiceResult<ServiceValue> {
        let center = match params::position_or_name(args, "coordinates")? {
            PositionOrName::Position(pos) => pos,
            PositionOrName::Name(name) => resolve_with(&self.tap, &name).await?,
        };
        let radius = params::radius_deg(args, "radius", DEFAULT_RADIUS_DEG)?;
        let adql = region_adql(&center, radius);
        Ok(self.tap.query(&adql, None).await?.into())
    }
}

#[async_trait]
impl ServiceTarget for SimbadService {
    fn service_name(&self) -> &str {
        "simbad"
    }

    fn members(&self) -> Vec<MemberSpec> {
        vec![
            MemberSpec::new("query_object", QUERY_OBJECT_DOC)
                .param(ParamSpec::required("object_name", "str"))
                .param(ParamSpec::optional(
                    "wildcard",
                    "bool",
                    serde_json::Value::Bool(false),
                )),
            MemberSpec::new("query_objectids", QUERY_OBJECTIDS_DOC)
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
            "query_objectids" => self.query_objectids(args).await,
            "query_region" => self.query_region(args).await,
            other => Err(ServiceError::unknown_operation(other)),
        }
    }
}

/// Resolves an object name to a position through a SIMBAD identifier lookup.
///
/// Shared with backends whose archives cannot resolve names themselves.
pub(crate) async fn resolve_with(tap: &TapClient, name: &str) -> ServiceResult<SkyPosition> {
    let escaped = params::escape_adql(name);
    let adql = format!(
        "SELECT TOP 1 basic.ra, basic.dec FROM basic \
         JOIN ident ON ident.oidref = basic.oid WHERE ident.id = '{escaped}'"
    );
    let table = tap.query(&adql, Some(1)).await?;
    let (Some(ra), Some(dec)) = (table.cell(0, "ra"), table.cell(0, "dec")) else {
        return Err(ServiceError::invalid_parameter(
            "coordinates",
            format!("object `{name}` could not be resolved to a position"),
        ));
    };
    match (cell_f64(ra), cell_f64(dec)) {
        (Some(ra_deg), Some(dec_deg)) => Ok(SkyPosition::new(ra_deg, dec_deg)),
        _ => Err(ServiceError::invalid_parameter(
            "coordinates",
            format!("object `{name}` resolved without usable coordinates"),
        )),
    }
}

pub(crate) fn cell_f64(cell: &sky_primitives::Cell) -> Option<f64> {
    match cell {
        sky_primitives::Cell::Float(f) => Some(*f),
        #[allow(clippy::cast_precision_loss)]
        sky_primitives::Cell::Int(i) => Some(*i as f64),
        _ => None,
    }
}

fn object_adql(name: &str, wildcard: bool) -> String {
    let escaped = params::escape_adql(name);
    if wildcard {
        let pattern = escaped.replace('*', "%");
        format!(
            "SELECT basic.main_id, basic.ra, basic.dec, basic.otype FROM basic \
             JOIN ident ON ident.oidref = basic.oid WHERE ident.id LIKE '{pattern}'"
        )
    } else {
        format!(
            "SELECT basic.main_id, basic.ra, basic.dec, basic.otype FROM basic \
             JOIN ident ON ident.oidref = basic.oid WHERE ident.id = '{escaped}'"
        )
    }
}

fn objectids_adql(name: &str) -> String {
    let escaped = params::escape_adql(name);
    format!(
        "SELECT alias.id FROM ident AS alias \
         JOIN ident AS lookup ON lookup.oidref = alias.oidref \
         WHERE lookup.id = '{escaped}'"
    )
}

fn region_adql(center: &SkyPosition, radius_deg: f64) -> String {
    format!(
        "SELECT basic.main_id, basic.ra, basic.dec, basic.otype FROM basic \
         WHERE CONTAINS(POINT('ICRS', basic.ra, basic.dec), \
         CIRCLE('ICRS', {ra}, {dec}, {radius_deg})) = 1",
        ra = center.ra_deg(),
        dec = center.dec_deg(),
    )
}
