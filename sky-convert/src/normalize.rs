//! Recursive type-dispatch converting backend values into JSON-safe
//! structures.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use sky_primitives::{Cell, ServiceValue, TableValue};

/// Key used to tag best-effort literal renderings of untyped values.
const REPR_KEY: &str = "__repr__";

/// The normalizer could not represent a value.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A table row does not carry one cell per column.
    #[error("table row {row} has {actual} cells, expected {expected}")]
    RaggedTable {
        /// Zero-based row index.
        row: usize,
        /// Number of declared columns.
        expected: usize,
        /// Number of cells in the offending row.
        actual: usize,
    },
}

/// Converts a backend value into a JSON-safe structure.
///
/// Pure and total over the expected value shapes: tables become
/// `{columns, data, row_count}`, positions become `{ra_deg, dec_deg, frame}`,
/// quantities become `{value, unit}`, mappings and sequences recurse with
/// order preserved, non-finite floats and masked cells become explicit
/// nulls, and untyped values fall back to a tagged literal rendering.
///
/// # Errors
///
/// Returns [`NormalizeError::RaggedTable`] when a tabular value carries a
/// row whose cell count differs from its column count; a partial payload is
/// never produced.
pub fn normalize(value: &ServiceValue) -> Result<Value, NormalizeError> {
    match value {
        ServiceValue::Null => Ok(Value::Null),
        ServiceValue::Bool(b) => Ok(Value::Bool(*b)),
        ServiceValue::Int(i) => Ok(Value::Number((*i).into())),
        ServiceValue::Float(f) => Ok(finite_number(*f)),
        ServiceValue::Text(s) => Ok(Value::String(s.clone())),
        ServiceValue::Bytes(bytes) => Ok(Value::String(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
        ServiceValue::Position(position) => {
            let mut map = Map::new();
            map.insert("ra_deg".into(), finite_number(position.ra_deg()));
            map.insert("dec_deg".into(), finite_number(position.dec_deg()));
            map.insert("frame".into(), Value::String(position.frame().to_owned()));
            Ok(Value::Object(map))
        }
        ServiceValue::Quantity(quantity) => {
            let mut map = Map::new();
            map.insert("value".into(), finite_number(quantity.value()));
            map.insert("unit".into(), Value::String(quantity.unit().as_str().into()));
            Ok(Value::Object(map))
        }
        ServiceValue::Array(items) => items
            .iter()
            .map(normalize)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        ServiceValue::Record(fields) => {
            let mut map = Map::new();
            for (key, field) in fields {
                map.insert(key.clone(), normalize(field)?);
            }
            Ok(Value::Object(map))
        }
        ServiceValue::Table(table) => normalize_table(table),
        ServiceValue::Opaque(rendering) => {
            let mut map = Map::new();
            map.insert(REPR_KEY.into(), Value::String(rendering.clone()));
            Ok(Value::Object(map))
        }
    }
}

fn normalize_table(table: &TableValue) -> Result<Value, NormalizeError> {
    let names: Vec<&str> = table.column_names();

    let mut data = Vec::with_capacity(table.row_count());
    for (index, row) in table.rows().iter().enumerate() {
        if row.len() != names.len() {
            return Err(NormalizeError::RaggedTable {
                row: index,
                expected: names.len(),
                actual: row.len(),
            });
        }

        let mut record = Map::new();
        for (name, cell) in names.iter().zip(row) {
            record.insert((*name).to_owned(), cell_value(cell));
        }
        data.push(Value::Object(record));
    }

    let mut payload = Map::new();
    payload.insert(
        "columns".into(),
        Value::Array(names.iter().map(|n| Value::String((*n).to_owned())).collect()),
    );
    payload.insert("data".into(), Value::Array(data));
    payload.insert("row_count".into(), Value::Number(table.row_count().into()));
    Ok(Value::Object(payload))
}

fn cell_value(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Int(i) => Value::Number((*i).into()),
        Cell::Float(f) => finite_number(*f),
        Cell::Text(s) => Value::String(s.clone()),
    }
}

/// Non-finite floats have no JSON rendering and become explicit null.
fn finite_number(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sky_primitives::{AngularQuantity, AngularUnit, ColumnSpec, SkyPosition};

    #[test]
    fn table_payload_shape() {
        let mut table = TableValue::new(vec![
            ColumnSpec::new("main_id"),
            ColumnSpec::new("ra").with_unit("deg"),
        ]);
        table.push_row(vec![Cell::Text("M 31".into()), Cell::Float(10.68)]);
        table.push_row(vec![Cell::Text("M 33".into()), Cell::Null]);

        let payload = normalize(&ServiceValue::Table(table)).unwrap();
        assert_eq!(payload["columns"], json!(["main_id", "ra"]));
        assert_eq!(payload["row_count"], json!(2));
        assert_eq!(payload["data"].as_array().unwrap().len(), 2);
        // Masked cell survives as explicit null; the row is never dropped.
        assert_eq!(payload["data"][1]["ra"], Value::Null);
    }

    #[test]
    fn ragged_table_is_rejected() {
        let mut table = TableValue::new(vec![ColumnSpec::new("a"), ColumnSpec::new("b")]);
        table.push_row(vec![Cell::Int(1)]);

        let err = normalize(&ServiceValue::Table(table)).expect_err("ragged");
        assert!(matches!(err, NormalizeError::RaggedTable { row: 0, .. }));
    }

    #[test]
    fn position_and_quantity_shapes() {
        let position = normalize(&ServiceValue::Position(SkyPosition::new(10.68, 41.27))).unwrap();
        assert_eq!(position, json!({"ra_deg": 10.68, "dec_deg": 41.27, "frame": "icrs"}));

        let quantity = normalize(&ServiceValue::Quantity(AngularQuantity::new(
            5.0,
            AngularUnit::Arcsec,
        )))
        .unwrap();
        assert_eq!(quantity, json!({"value": 5.0, "unit": "arcsec"}));
    }

    #[test]
    fn numeric_array_preserves_length_and_order() {
        let array = ServiceValue::Array(vec![
            ServiceValue::Int(1),
            ServiceValue::Int(2),
            ServiceValue::Int(3),
        ]);
        assert_eq!(normalize(&array).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(normalize(&ServiceValue::Float(f64::NAN)).unwrap(), Value::Null);
        assert_eq!(
            normalize(&ServiceValue::Float(f64::INFINITY)).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn bytes_become_lossy_text() {
        let value = ServiceValue::Bytes(vec![0x4d, 0x33, 0x31]);
        assert_eq!(normalize(&value).unwrap(), json!("M31"));
    }

    #[test]
    fn opaque_values_are_tagged() {
        let payload = normalize(&ServiceValue::Opaque("<AdqlJob 0x1f>".into())).unwrap();
        assert_eq!(payload, json!({"__repr__": "<AdqlJob 0x1f>"}));
    }

    #[test]
    fn idempotent_on_json_safe_input() {
        let raw = json!({"b": [1, 2.5, null], "a": {"nested": true}, "s": "text"});
        let once = normalize(&ServiceValue::from(raw)).unwrap();
        let twice = normalize(&ServiceValue::from(once.clone())).unwrap();
        assert_eq!(once, twice);
    }
}
