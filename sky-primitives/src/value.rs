//! Domain values exchanged between coercion, backends, and normalization.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::table::TableValue;

/// Coordinate frame assumed when a caller does not specify one.
pub const DEFAULT_FRAME: &str = "icrs";

/// Angular units accepted for radius- and distance-shaped parameters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngularUnit {
    /// Degrees.
    Deg,
    /// Arcminutes.
    Arcmin,
    /// Arcseconds.
    Arcsec,
    /// Milliarcseconds.
    Mas,
    /// Hour angle (15 degrees per hour).
    Hourangle,
}

impl AngularUnit {
    /// Returns the canonical unit spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deg => "deg",
            Self::Arcmin => "arcmin",
            Self::Arcsec => "arcsec",
            Self::Mas => "mas",
            Self::Hourangle => "hourangle",
        }
    }

    /// Degrees represented by one of this unit.
    #[must_use]
    pub const fn degrees_per_unit(self) -> f64 {
        match self {
            Self::Deg => 1.0,
            Self::Arcmin => 1.0 / 60.0,
            Self::Arcsec => 1.0 / 3600.0,
            Self::Mas => 1.0 / 3_600_000.0,
            Self::Hourangle => 15.0,
        }
    }
}

impl Display for AngularUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AngularUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deg" | "degree" | "degrees" => Ok(Self::Deg),
            "arcmin" | "arcminute" | "arcminutes" | "amin" => Ok(Self::Arcmin),
            "arcsec" | "arcsecond" | "arcseconds" | "asec" => Ok(Self::Arcsec),
            "mas" | "milliarcsecond" | "milliarcseconds" => Ok(Self::Mas),
            "hourangle" | "hour" | "hours" => Ok(Self::Hourangle),
            other => Err(Error::UnknownUnit { unit: other.into() }),
        }
    }
}

/// An angular measurement with an explicit unit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngularQuantity {
    value: f64,
    unit: AngularUnit,
}

impl AngularQuantity {
    /// Creates a quantity from a value and unit.
    #[must_use]
    pub const fn new(value: f64, unit: AngularUnit) -> Self {
        Self { value, unit }
    }

    /// Returns the numeric value in the quantity's own unit.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.value
    }

    /// Returns the unit.
    #[must_use]
    pub const fn unit(self) -> AngularUnit {
        self.unit
    }

    /// Converts the quantity to degrees.
    #[must_use]
    pub fn in_degrees(self) -> f64 {
        self.value * self.unit.degrees_per_unit()
    }
}

/// A sky position with an explicit coordinate frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkyPosition {
    ra_deg: f64,
    dec_deg: f64,
    frame: String,
}

impl SkyPosition {
    /// Creates a position in the default frame.
    #[must_use]
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            ra_deg,
            dec_deg,
            frame: DEFAULT_FRAME.to_owned(),
        }
    }

    /// Overrides the coordinate frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.frame = frame.into();
        self
    }

    /// Right ascension in degrees.
    #[must_use]
    pub const fn ra_deg(&self) -> f64 {
        self.ra_deg
    }

    /// Declination in degrees.
    #[must_use]
    pub const fn dec_deg(&self) -> f64 {
        self.dec_deg
    }

    /// Coordinate frame name (e.g. `icrs`).
    #[must_use]
    pub fn frame(&self) -> &str {
        &self.frame
    }
}

/// A coerced invocation argument.
///
/// Coercion either lifts a raw JSON value into a domain variant or leaves it
/// untouched as [`Argument::Raw`].
#[derive(Clone, Debug, PartialEq)]
pub enum Argument {
    /// The value passed through coercion unchanged.
    Raw(Value),
    /// A coordinate-shaped value.
    Position(SkyPosition),
    /// A radius- or distance-shaped value.
    Quantity(AngularQuantity),
    /// A unit-shaped value.
    Unit(AngularUnit),
}

impl Argument {
    /// Returns the raw string content, if this is a raw string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Raw(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric content, if this is a raw number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Raw(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Returns the unsigned integer content, if this is a raw number.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Raw(Value::Number(n)) => n.as_u64(),
            _ => None,
        }
    }

    /// Returns the boolean content, if this is a raw boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Raw(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns the coerced position, if any.
    #[must_use]
    pub fn position(&self) -> Option<&SkyPosition> {
        match self {
            Self::Position(p) => Some(p),
            _ => None,
        }
    }

    /// Returns the coerced quantity, if any.
    #[must_use]
    pub fn quantity(&self) -> Option<AngularQuantity> {
        match self {
            Self::Quantity(q) => Some(*q),
            _ => None,
        }
    }

    /// Returns the coerced unit, if any.
    #[must_use]
    pub fn unit(&self) -> Option<AngularUnit> {
        match self {
            Self::Unit(u) => Some(*u),
            _ => None,
        }
    }
}

/// Name-keyed coerced arguments handed to a backend invocation.
pub type ArgumentMap = BTreeMap<String, Argument>;

/// A return value produced by a service backend, before normalization.
///
/// This is the tagged variant set the normalizer dispatches over; it stands
/// in for the heterogeneous domain objects a dynamically-typed target
/// library would return.
#[derive(Clone, Debug, PartialEq)]
pub enum ServiceValue {
    /// Absent value.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar; non-finite values normalize to null.
    Float(f64),
    /// Text scalar.
    Text(String),
    /// Raw bytes; normalized to lossy UTF-8 text.
    Bytes(Vec<u8>),
    /// A sky position.
    Position(SkyPosition),
    /// An angular quantity.
    Quantity(AngularQuantity),
    /// Ordered sequence of values.
    Array(Vec<ServiceValue>),
    /// Order-preserving mapping of field name to value.
    Record(Vec<(String, ServiceValue)>),
    /// A tabular result.
    Table(TableValue),
    /// A value the backend could not type; normalized to a tagged rendering.
    Opaque(String),
}

impl From<TableValue> for ServiceValue {
    fn from(value: TableValue) -> Self {
        Self::Table(value)
    }
}

impl From<String> for ServiceValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ServiceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<f64> for ServiceValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<i64> for ServiceValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for ServiceValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Value> for ServiceValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n.as_i64().map_or_else(
                || Self::Float(n.as_f64().unwrap_or(f64::NAN)),
                Self::Int,
            ),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(fields) => Self::Record(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Self::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_parsing_accepts_aliases() {
        assert_eq!("arcminutes".parse::<AngularUnit>().unwrap(), AngularUnit::Arcmin);
        assert_eq!("DEG".parse::<AngularUnit>().unwrap(), AngularUnit::Deg);
        assert!("parsec".parse::<AngularUnit>().is_err());
    }

    #[test]
    fn quantity_converts_to_degrees() {
        let q = AngularQuantity::new(30.0, AngularUnit::Arcmin);
        assert!((q.in_degrees() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn position_defaults_to_icrs() {
        let p = SkyPosition::new(10.68, 41.27);
        assert_eq!(p.frame(), DEFAULT_FRAME);
        assert_eq!(p.with_frame("galactic").frame(), "galactic");
    }

    #[test]
    fn service_value_from_json_preserves_shape() {
        let value = serde_json::json!({"a": [1, 2.5, null], "b": "x"});
        let ServiceValue::Record(fields) = ServiceValue::from(value) else {
            panic!("expected record");
        };
        assert_eq!(fields[0].0, "a");
        assert_eq!(fields[1].1, ServiceValue::Text("x".into()));
    }
}
