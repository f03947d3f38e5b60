//! Tabular values returned by service backends.

use serde::{Deserialize, Serialize};

/// A single table cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Missing or masked value.
    Null,
    /// Boolean cell.
    Bool(bool),
    /// Integer cell.
    Int(i64),
    /// Floating-point cell; non-finite values normalize to null.
    Float(f64),
    /// Text cell.
    Text(String),
}

/// Column metadata carried alongside table data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    name: String,
    /// Advisory datatype reported by the service (may be empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    dtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl ColumnSpec {
    /// Creates a column with just a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: String::new(),
            unit: None,
            description: None,
        }
    }

    /// Sets the advisory datatype string.
    #[must_use]
    pub fn with_dtype(mut self, dtype: impl Into<String>) -> Self {
        self.dtype = dtype.into();
        self
    }

    /// Sets the physical unit reported by the service.
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the column description reported by the service.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the advisory datatype (may be empty).
    #[must_use]
    pub fn dtype(&self) -> &str {
        &self.dtype
    }

    /// Returns the unit, if reported.
    #[must_use]
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Returns the description, if reported.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// An ordered tabular result: columns plus rows of cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct TableValue {
    columns: Vec<ColumnSpec>,
    rows: Vec<Vec<Cell>>,
}

impl TableValue {
    /// Creates an empty table with the given columns.
    #[must_use]
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row. Callers are expected to supply one cell per column;
    /// the normalizer rejects ragged tables.
    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Returns the column metadata in declared order.
    #[must_use]
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Returns the column names in declared order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnSpec::name).collect()
    }

    /// Returns the rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the cell at `(row, column name)`, if present.
    #[must_use]
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.columns.iter().position(|c| c.name() == column)?;
        self.rows.get(row)?.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_lookup_by_column_name() {
        let mut table = TableValue::new(vec![
            ColumnSpec::new("main_id"),
            ColumnSpec::new("ra").with_unit("deg"),
        ]);
        table.push_row(vec![Cell::Text("M 31".into()), Cell::Float(10.684_79)]);

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, "main_id"), Some(&Cell::Text("M 31".into())));
        assert_eq!(table.cell(0, "missing"), None);
    }
}
