//! Declarative predicate/transform rules lifting raw JSON arguments into
//! domain values.
//!
//! Rules are evaluated in a fixed priority order and the first match wins.
//! An unmatched value always passes through unchanged; only a matched
//! transform can fail.

use serde_json::Value;
use thiserror::Error;

use sky_primitives::{AngularQuantity, AngularUnit, Argument, SkyPosition, DEFAULT_FRAME};

/// Parameter names treated as coordinate-shaped.
const COORD_PARAMS: &[&str] = &["coordinates", "coord", "coords", "center", "position", "pos", "target"];

/// Parameter names treated as radius- or distance-shaped.
const RADIUS_PARAMS: &[&str] = &["radius", "rad", "search_radius", "cone_radius", "width", "height"];

/// Unit assumed for bare-number radius values.
const DEFAULT_RADIUS_UNIT: AngularUnit = AngularUnit::Arcmin;

/// A matched transform rejected the supplied value.
#[derive(Debug, Error)]
#[error("cannot coerce parameter `{parameter}`: {reason}")]
pub struct CoercionError {
    parameter: String,
    raw_value: Value,
    reason: String,
}

impl CoercionError {
    fn new(parameter: &str, raw_value: &Value, reason: impl Into<String>) -> Self {
        Self {
            parameter: parameter.to_owned(),
            raw_value: raw_value.clone(),
            reason: reason.into(),
        }
    }

    /// Returns the parameter name that failed coercion.
    #[must_use]
    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    /// Returns the raw value that was rejected.
    #[must_use]
    pub const fn raw_value(&self) -> &Value {
        &self.raw_value
    }

    /// Returns the human-readable reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// One predicate/transform pair.
pub struct CoercionRule {
    name: &'static str,
    predicate: fn(&str, &Value) -> bool,
    transform: fn(&str, &Value) -> Result<Argument, CoercionError>,
}

impl CoercionRule {
    /// Creates a rule from a predicate and a transform.
    #[must_use]
    pub const fn new(
        name: &'static str,
        predicate: fn(&str, &Value) -> bool,
        transform: fn(&str, &Value) -> Result<Argument, CoercionError>,
    ) -> Self {
        Self {
            name,
            predicate,
            transform,
        }
    }

    /// Returns the rule's diagnostic name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Ordered, first-match-wins coercion rule table.
pub struct CoercionTable {
    rules: Vec<CoercionRule>,
}

impl CoercionTable {
    /// Builds the built-in rule set: coordinates, then radii, then units.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                CoercionRule::new("coordinate", coordinate_matches, coerce_coordinate),
                CoercionRule::new("radius", radius_matches, coerce_radius),
                CoercionRule::new("unit", unit_matches, coerce_unit),
            ],
        }
    }

    /// Builds a table from custom rules.
    #[must_use]
    pub fn new(rules: Vec<CoercionRule>) -> Self {
        Self { rules }
    }

    /// Coerces one argument. Unmatched values pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError`] only when a matched transform rejects the
    /// value.
    pub fn coerce(&self, parameter: &str, raw: &Value) -> Result<Argument, CoercionError> {
        for rule in &self.rules {
            if (rule.predicate)(parameter, raw) {
                return (rule.transform)(parameter, raw);
            }
        }
        Ok(Argument::Raw(raw.clone()))
    }
}

impl Default for CoercionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn coordinate_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    COORD_PARAMS.contains(&lower.as_str()) || lower.contains("coord")
}

fn coordinate_mapping(value: &Value) -> bool {
    value.as_object().is_some_and(|map| {
        (map.get("ra").is_some_and(Value::is_number) && map.get("dec").is_some_and(Value::is_number))
            || (map.get("lon").is_some_and(Value::is_number)
                && map.get("lat").is_some_and(Value::is_number))
    })
}

fn coordinate_matches(name: &str, value: &Value) -> bool {
    // Plain strings are left alone so object names reach the backend, which
    // resolves them itself.
    (coordinate_name(name) && (value.is_object() || parse_pair(value).is_some()))
        || coordinate_mapping(value)
}

fn coerce_coordinate(name: &str, value: &Value) -> Result<Argument, CoercionError> {
    if let Some(map) = value.as_object() {
        let pair = map
            .get("ra")
            .zip(map.get("dec"))
            .or_else(|| map.get("lon").zip(map.get("lat")))
            .and_then(|(a, b)| a.as_f64().zip(b.as_f64()));
        let Some((ra_deg, dec_deg)) = pair else {
            return Err(CoercionError::new(
                name,
                value,
                "coordinate mapping must carry numeric ra/dec (or lon/lat)",
            ));
        };
        let frame = map
            .get("frame")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_FRAME);
        return Ok(Argument::Position(
            SkyPosition::new(ra_deg, dec_deg).with_frame(frame),
        ));
    }

    if let Some((ra_deg, dec_deg)) = parse_pair(value) {
        return Ok(Argument::Position(SkyPosition::new(ra_deg, dec_deg)));
    }

    Err(CoercionError::new(
        name,
        value,
        "expected a coordinate mapping or a numeric `ra dec` string",
    ))
}

/// Parses `"10.68 41.27"` or `"10.68, +41.27"` into a degree pair.
fn parse_pair(value: &Value) -> Option<(f64, f64)> {
    let text = value.as_str()?;
    let mut parts = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty());
    let ra = parts.next()?.parse::<f64>().ok()?;
    let dec = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((ra, dec))
}

fn radius_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    RADIUS_PARAMS.contains(&lower.as_str()) || lower.contains("radius")
}

fn radius_matches(name: &str, value: &Value) -> bool {
    radius_name(name) && (value.is_number() || value.is_string() || value.is_object())
}

fn coerce_radius(name: &str, value: &Value) -> Result<Argument, CoercionError> {
    if let Some(number) = value.as_f64() {
        return Ok(Argument::Quantity(AngularQuantity::new(
            number,
            DEFAULT_RADIUS_UNIT,
        )));
    }

    if let Some(text) = value.as_str() {
        return parse_quantity_string(text).map(Argument::Quantity).ok_or_else(|| {
            CoercionError::new(name, value, "expected `<value> <unit>` with a known angular unit")
        });
    }

    if let Some(map) = value.as_object() {
        let number = map
            .get("value")
            .or_else(|| map.get("v"))
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                CoercionError::new(name, value, "quantity mapping must carry a numeric `value`")
            })?;
        let unit = match map.get("unit").or_else(|| map.get("u")) {
            Some(Value::String(unit)) => unit
                .parse::<AngularUnit>()
                .map_err(|err| CoercionError::new(name, value, err.to_string()))?,
            Some(other) => {
                return Err(CoercionError::new(
                    name,
                    value,
                    format!("`unit` must be a string, got {other}"),
                ));
            }
            None => DEFAULT_RADIUS_UNIT,
        };
        return Ok(Argument::Quantity(AngularQuantity::new(number, unit)));
    }

    Err(CoercionError::new(
        name,
        value,
        "expected a number, `<value> <unit>` string, or quantity mapping",
    ))
}

fn parse_quantity_string(text: &str) -> Option<AngularQuantity> {
    let trimmed = text.trim();
    if let Ok(number) = trimmed.parse::<f64>() {
        return Some(AngularQuantity::new(number, DEFAULT_RADIUS_UNIT));
    }

    let mut parts = trimmed.split_whitespace();
    let number = parts.next()?.parse::<f64>().ok()?;
    let unit = parts.next()?.parse::<AngularUnit>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(AngularQuantity::new(number, unit))
}

fn unit_matches(name: &str, value: &Value) -> bool {
    let lower = name.to_ascii_lowercase();
    (lower == "unit" || lower == "units" || lower.ends_with("_unit")) && value.is_string()
}

fn coerce_unit(name: &str, value: &Value) -> Result<Argument, CoercionError> {
    let text = value.as_str().unwrap_or_default();
    text.parse::<AngularUnit>()
        .map(Argument::Unit)
        .map_err(|err| CoercionError::new(name, value, err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> CoercionTable {
        CoercionTable::builtin()
    }

    #[test]
    fn bare_radius_number_gets_default_unit() {
        let arg = table().coerce("radius", &json!(0.1)).unwrap();
        let q = arg.quantity().expect("quantity");
        assert!((q.value() - 0.1).abs() < f64::EPSILON);
        assert_eq!(q.unit(), AngularUnit::Arcmin);
        assert!(!q.unit().as_str().is_empty());
    }

    #[test]
    fn radius_string_with_unit_parses() {
        let arg = table().coerce("radius", &json!("5 arcsec")).unwrap();
        let q = arg.quantity().expect("quantity");
        assert!((q.value() - 5.0).abs() < f64::EPSILON);
        assert_eq!(q.unit(), AngularUnit::Arcsec);
    }

    #[test]
    fn radius_mapping_parses() {
        let arg = table()
            .coerce("search_radius", &json!({"value": 2, "unit": "deg"}))
            .unwrap();
        assert_eq!(arg.quantity().unwrap().unit(), AngularUnit::Deg);
    }

    #[test]
    fn radius_with_unknown_unit_fails() {
        let err = table()
            .coerce("radius", &json!("5 parsec"))
            .expect_err("unknown unit");
        assert_eq!(err.parameter(), "radius");
    }

    #[test]
    fn coordinate_mapping_with_default_frame() {
        let arg = table()
            .coerce("coordinates", &json!({"ra": 10.68, "dec": 41.27}))
            .unwrap();
        let position = arg.position().expect("position");
        assert_eq!(position.frame(), "icrs");
        assert!((position.ra_deg() - 10.68).abs() < f64::EPSILON);
    }

    #[test]
    fn coordinate_mapping_honors_frame() {
        let arg = table()
            .coerce("coord", &json!({"ra": 1.0, "dec": 2.0, "frame": "galactic"}))
            .unwrap();
        assert_eq!(arg.position().unwrap().frame(), "galactic");
    }

    #[test]
    fn two_field_numeric_mapping_matches_under_any_name() {
        let arg = table()
            .coerce("somewhere", &json!({"lon": 121.17, "lat": -21.57}))
            .unwrap();
        assert!(arg.position().is_some());
    }

    #[test]
    fn coordinate_pair_string_parses() {
        let arg = table().coerce("coordinates", &json!("10.68 +41.27")).unwrap();
        let position = arg.position().expect("position");
        assert!((position.dec_deg() - 41.27).abs() < f64::EPSILON);
    }

    #[test]
    fn object_name_string_passes_through() {
        let arg = table().coerce("coordinates", &json!("M31")).unwrap();
        assert_eq!(arg.as_str(), Some("M31"));
    }

    #[test]
    fn unit_parameter_resolves() {
        let arg = table().coerce("radius_unit", &json!("arcsec")).unwrap();
        assert_eq!(arg.unit(), Some(AngularUnit::Arcsec));
    }

    #[test]
    fn unrelated_values_are_never_altered() {
        let nested = json!({"columns": ["a"], "rows": [[1, 2]]});
        for (name, value) in [
            ("object_name", json!("M31")),
            ("limit", json!(100)),
            ("verbose", json!(true)),
            ("filters", nested.clone()),
        ] {
            let arg = table().coerce(name, &value).unwrap();
            assert_eq!(arg, Argument::Raw(value));
        }
    }

    #[test]
    fn malformed_coordinate_mapping_fails() {
        let err = table()
            .coerce("coordinates", &json!({"ra": "ten"}))
            .expect_err("non-numeric ra");
        assert!(err.reason().contains("ra/dec"));
    }
}
