//! Record data model.
//!
//! A [`Record`] is one source row: an ordered mapping of field name to scalar
//! value. Field order is preserved from the source so that serialization is
//! deterministic, and a record is immutable once built.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Scalar value universe for one record field.
///
/// Covers exactly what a tabular cell can hold: nothing, a boolean, an
/// integer, a float, or text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Empty cell
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// String value
    Text(String),
}

impl FieldValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Try to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// One source row, immutable once built.
///
/// Fields are kept as an ordered list rather than a map: the wire payload
/// must be byte-identical every time the same record is encoded, and source
/// column order is part of that identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    row: u64,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Build a record from its originating row index and ordered fields.
    pub fn new(row: u64, fields: Vec<(String, FieldValue)>) -> Self {
        Self { row, fields }
    }

    /// Row index of this record in its source, 0-based.
    pub fn row(&self) -> u64 {
        self.row
    }

    /// Fields in source column order.
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// Serializes as a JSON-style object in field order. serde_json maps keyed
// by HashMap would not give stable output; driving the map sink directly
// from the ordered Vec does.
impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new(
            7,
            vec![
                ("id".to_string(), FieldValue::Int(42)),
                ("price".to_string(), FieldValue::Float(9.5)),
                ("active".to_string(), FieldValue::Bool(true)),
                ("note".to_string(), FieldValue::Null),
                ("symbol".to_string(), FieldValue::Text("ABC".to_string())),
            ],
        )
    }

    #[test]
    fn test_field_lookup() {
        let record = sample();
        assert_eq!(record.row(), 7);
        assert_eq!(record.len(), 5);
        assert_eq!(record.get("id").and_then(FieldValue::as_i64), Some(42));
        assert_eq!(record.get("symbol").and_then(FieldValue::as_str), Some("ABC"));
        assert!(record.get("note").unwrap().is_null());
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn test_serializes_in_field_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"id":42,"price":9.5,"active":true,"note":null,"symbol":"ABC"}"#
        );
    }
}
