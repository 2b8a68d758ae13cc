use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::btree_map;
use std::collections::BTreeMap;

/// A scalar value held by one field of an [`EventRecord`].
///
/// Serializes untagged, so a record round-trips through the engine as a plain
/// JSON object of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit null.
    #[default]
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar (both 32 and 64 bit engine types).
    Int(i64),
    /// Floating point scalar.
    Float(f64),
    /// Text scalar.
    Text(String),
}

impl FieldValue {
    /// Returns true for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Returns the value as an integer when it is one, or an integral float,
    /// or text holding an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns the value as text when it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the value kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Text(_) => "text",
        }
    }

    /// Converts a JSON value into a field value.
    ///
    /// Arrays and objects have no scalar form; they are kept as their JSON text.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Text(other.to_string()),
        }
    }

    /// Converts the field value into a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// Flat mapping of field name to scalar value: one logged occurrence.
///
/// Keys are kept sorted so serialized documents are deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRecord(BTreeMap<String, FieldValue>);

/// A row returned by the engine has the same shape as a written record.
pub type Row = EventRecord;

impl EventRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from a JSON object, converting each member to a scalar.
    pub fn from_json_object(object: Map<String, Value>) -> Self {
        object
            .into_iter()
            .map(|(k, v)| (k, FieldValue::from_json(v)))
            .collect()
    }

    /// Returns the value of a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(field.into(), value.into())
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.0.remove(field)
    }

    /// Returns true if the field is present (null counts as present).
    pub fn contains_key(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates fields in name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.0.iter()
    }

    /// Field names in name order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Converts the record into a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.to_json_map())
    }

    /// Converts the record into a JSON object map.
    pub fn to_json_map(&self) -> Map<String, Value> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect()
    }

    /// Consumes the record, returning the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, FieldValue> {
        self.0
    }
}

impl FromIterator<(String, FieldValue)> for EventRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for EventRecord {
    type Item = (String, FieldValue);
    type IntoIter = btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<BTreeMap<String, FieldValue>> for EventRecord {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_scalars_map_to_variants() {
        assert_eq!(FieldValue::from_json(json!(null)), FieldValue::Null);
        assert_eq!(FieldValue::from_json(json!(7)), FieldValue::Int(7));
        assert_eq!(FieldValue::from_json(json!(1.5)), FieldValue::Float(1.5));
        assert_eq!(FieldValue::from_json(json!("x")), FieldValue::Text("x".into()));
        assert_eq!(
            FieldValue::from_json(json!({"a": 1})),
            FieldValue::Text("{\"a\":1}".into())
        );
    }

    #[test]
    fn untagged_serialization_is_plain_json() {
        let mut record = EventRecord::new();
        record.insert("userid", 5i64);
        record.insert("ip", "10.0.0.1");
        record.insert("realuserid", FieldValue::Null);

        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"ip":"10.0.0.1","realuserid":null,"userid":5}"#);

        let back: EventRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn as_i64_accepts_integral_forms() {
        assert_eq!(FieldValue::Int(3).as_i64(), Some(3));
        assert_eq!(FieldValue::Float(4.0).as_i64(), Some(4));
        assert_eq!(FieldValue::Float(4.5).as_i64(), None);
        assert_eq!(FieldValue::Text(" 12 ".into()).as_i64(), Some(12));
        assert_eq!(FieldValue::Null.as_i64(), None);
    }

    #[test]
    fn option_conversion_yields_null() {
        let none: Option<i64> = None;
        assert!(FieldValue::from(none).is_null());
        assert_eq!(FieldValue::from(Some(9i64)), FieldValue::Int(9));
    }
}
