//! Argument extraction helpers shared by the service backends.

use sky_primitives::{Argument, ArgumentMap, SkyPosition};

use crate::traits::{ServiceError, ServiceResult};

/// Extracts a required string argument.
pub fn require_str<'a>(args: &'a ArgumentMap, name: &str) -> ServiceResult<&'a str> {
    args.get(name)
        .and_then(Argument::as_str)
        .ok_or_else(|| ServiceError::invalid_parameter(name, "expected a string value"))
}

/// Extracts an optional string argument.
#[must_use]
pub fn opt_str<'a>(args: &'a ArgumentMap, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Argument::as_str)
}

/// Extracts an optional boolean argument.
#[must_use]
pub fn opt_bool(args: &ArgumentMap, name: &str) -> Option<bool> {
    args.get(name).and_then(Argument::as_bool)
}

/// Extracts an optional unsigned integer argument.
#[must_use]
pub fn opt_u64(args: &ArgumentMap, name: &str) -> Option<u64> {
    args.get(name).and_then(Argument::as_u64)
}

/// Extracts a search radius in degrees, falling back to `default_deg` when
/// the argument is absent.
pub fn radius_deg(args: &ArgumentMap, name: &str, default_deg: f64) -> ServiceResult<f64> {
    match args.get(name) {
        None => Ok(default_deg),
        Some(arg) => match arg.quantity() {
            Some(q) => Ok(q.in_degrees()),
            None => arg.as_f64().map(|v| v / 60.0).ok_or_else(|| {
                ServiceError::invalid_parameter(name, "expected an angular quantity or number")
            }),
        },
    }
}

/// A positional argument that is either already resolved coordinates or an
/// object name the backend must resolve itself.
#[derive(Clone, Debug, PartialEq)]
pub enum PositionOrName {
    /// Resolved sky coordinates.
    Position(SkyPosition),
    /// An object designation to resolve service-side.
    Name(String),
}

/// Extracts a coordinate-bearing argument as either a resolved position or
/// an unresolved object name.
pub fn position_or_name(args: &ArgumentMap, name: &str) -> ServiceResult<PositionOrName> {
    let arg = args
        .get(name)
        .ok_or_else(|| ServiceError::invalid_parameter(name, "argument is required"))?;
    if let Some(pos) = arg.position() {
        return Ok(PositionOrName::Position(pos.clone()));
    }
    if let Some(text) = arg.as_str() {
        if !text.trim().is_empty() {
            return Ok(PositionOrName::Name(text.trim().to_owned()));
        }
    }
    Err(ServiceError::invalid_parameter(
        name,
        "expected coordinates or a non-empty object name",
    ))
}

/// Escapes a string literal for embedding in an ADQL query.
#[must_use]
pub fn escape_adql(text: &str) -> String {
    text.replace('\'', "''")
}
