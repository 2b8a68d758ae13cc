//! The fixed field registry of the event index.

use crate::errors::SchemaError;
use crate::value::{EventRecord, FieldValue};
use serde_json::{json, Map, Value};

/// Name of the insertion-time tie-breaker field attached by the writer.
pub const ACUTIME: &str = "acutime";

/// Engine-native type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Full-text field with a `keyword` sub-field for exact matching and sorting.
    TextKeyword,
    /// 64-bit integer (`long`).
    Integer64,
    /// 32-bit integer (`integer`).
    Integer32,
}

impl FieldType {
    /// The engine's name for this type.
    pub fn engine_name(self) -> &'static str {
        match self {
            FieldType::TextKeyword => "text",
            FieldType::Integer64 => "long",
            FieldType::Integer32 => "integer",
        }
    }

    /// Mapping fragment used when creating the index.
    pub fn mapping(self) -> Value {
        match self {
            FieldType::TextKeyword => json!({
                "type": "text",
                "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
            }),
            other => json!({ "type": other.engine_name() }),
        }
    }

    fn accepts(self, value: &FieldValue) -> bool {
        match self {
            FieldType::TextKeyword => matches!(value, FieldValue::Text(_)),
            FieldType::Integer64 | FieldType::Integer32 => value.as_i64().is_some(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            FieldType::TextKeyword => "text+keyword",
            FieldType::Integer64 => "integer64",
            FieldType::Integer32 => "integer32",
        }
    }
}

/// One registered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as stored in the engine.
    pub name: &'static str,
    /// Engine type.
    pub field_type: FieldType,
    /// Whether null is a legitimate value.
    pub nullable: bool,
}

const fn field(name: &'static str, field_type: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        field_type,
        nullable: false,
    }
}

const fn nullable(name: &'static str, field_type: FieldType) -> FieldSpec {
    FieldSpec {
        name,
        field_type,
        nullable: true,
    }
}

const STANDARD_FIELDS: &[FieldSpec] = &[
    field("action", FieldType::TextKeyword),
    field(ACUTIME, FieldType::Integer64),
    field("anonymous", FieldType::Integer64),
    field("component", FieldType::TextKeyword),
    field("contextid", FieldType::Integer64),
    field("contextinstanceid", FieldType::Integer64),
    field("contextlevel", FieldType::Integer64),
    nullable("courseid", FieldType::Integer64),
    field("crud", FieldType::TextKeyword),
    field("edulevel", FieldType::Integer64),
    field("eventname", FieldType::TextKeyword),
    nullable("ip", FieldType::TextKeyword),
    nullable("objectid", FieldType::Integer32),
    nullable("objecttable", FieldType::TextKeyword),
    nullable("origin", FieldType::TextKeyword),
    field("other", FieldType::TextKeyword),
    nullable("realuserid", FieldType::Integer64),
    nullable("relateduserid", FieldType::Integer32),
    field("target", FieldType::TextKeyword),
    field("timecreated", FieldType::Integer64),
    field("userid", FieldType::Integer32),
];

/// Registry of the fields every indexed event carries.
///
/// The registry is the single source for both the index-creation payload and
/// the compatibility check run against an existing index.
#[derive(Debug, Clone, Copy)]
pub struct SchemaRegistry {
    fields: &'static [FieldSpec],
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl SchemaRegistry {
    /// The standard event schema.
    pub fn standard() -> Self {
        Self {
            fields: STANDARD_FIELDS,
        }
    }

    /// All registered fields, in name order.
    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of all registered fields, including `acutime`.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|f| f.name)
    }

    /// Names of the fields a host event supplies (everything except `acutime`).
    pub fn host_field_names(&self) -> impl Iterator<Item = &'static str> {
        self.field_names().filter(|name| *name != ACUTIME)
    }

    /// The `properties` object of the index mapping.
    pub fn mapping_properties(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), f.field_type.mapping()))
            .collect();
        Value::Object(properties)
    }

    /// Body for the index-creation request.
    pub fn index_body(&self) -> Value {
        json!({ "mappings": { "properties": self.mapping_properties() } })
    }

    /// Compares an existing index's `properties` object against the registry.
    ///
    /// Returns one entry per disagreement; an empty list means the mapping
    /// matches the registry exactly.
    pub fn check_mapping(&self, properties: &Value) -> Vec<SchemaError> {
        let Some(existing) = properties.as_object() else {
            return vec![SchemaError::InvalidMapping(
                "properties is not an object".to_string(),
            )];
        };

        let mut problems = Vec::new();
        for spec in self.fields {
            let Some(found) = existing.get(spec.name) else {
                problems.push(SchemaError::MissingField(spec.name.to_string()));
                continue;
            };
            let found_type = found.get("type").and_then(Value::as_str).unwrap_or("none");
            let keyword_ok = spec.field_type != FieldType::TextKeyword
                || found
                    .pointer("/fields/keyword/type")
                    .and_then(Value::as_str)
                    == Some("keyword");
            if found_type != spec.field_type.engine_name() || !keyword_ok {
                problems.push(SchemaError::TypeMismatch {
                    field: spec.name.to_string(),
                    expected: spec.field_type.describe().to_string(),
                    found: found_type.to_string(),
                });
            }
        }
        for name in existing.keys() {
            if self.field(name).is_none() {
                problems.push(SchemaError::UnexpectedField(name.clone()));
            }
        }
        problems
    }

    /// Like [`check_mapping`](Self::check_mapping) but fails on the first problem.
    pub fn validate_mapping(&self, properties: &Value) -> Result<(), SchemaError> {
        match self.check_mapping(properties).into_iter().next() {
            Some(problem) => Err(problem),
            None => Ok(()),
        }
    }

    /// Builds a field-complete copy of a record.
    ///
    /// Missing fields become explicit nulls and fields the registry does not
    /// know are dropped. `acutime` is taken from the input only if present.
    pub fn complete(&self, record: &EventRecord) -> EventRecord {
        self.fields
            .iter()
            .map(|f| {
                let value = record.get(f.name).cloned().unwrap_or(FieldValue::Null);
                (f.name.to_string(), value)
            })
            .collect()
    }

    /// Checks a record's values against the declared types.
    pub fn check_record(&self, record: &EventRecord) -> Vec<SchemaError> {
        let mut problems = Vec::new();
        for spec in self.fields {
            match record.get(spec.name) {
                None | Some(FieldValue::Null) => {
                    if !spec.nullable {
                        problems.push(SchemaError::MissingField(spec.name.to_string()));
                    }
                }
                Some(value) if !spec.field_type.accepts(value) => {
                    problems.push(SchemaError::TypeMismatch {
                        field: spec.name.to_string(),
                        expected: spec.field_type.describe().to_string(),
                        found: value.kind().to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        for name in record.keys() {
            if self.field(name).is_none() {
                problems.push(SchemaError::UnexpectedField(name.to_string()));
            }
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_has_every_event_field() {
        let registry = SchemaRegistry::standard();
        let names: Vec<_> = registry.field_names().collect();
        assert_eq!(names.len(), 21);
        assert!(names.contains(&ACUTIME));
        assert!(!registry.host_field_names().any(|n| n == ACUTIME));
        assert_eq!(
            registry.field("objectid").map(|f| f.field_type),
            Some(FieldType::Integer32)
        );
        assert!(registry.field("realuserid").unwrap().nullable);
        assert!(!registry.field("userid").unwrap().nullable);
    }

    #[test]
    fn optional_host_fields_are_nullable() {
        let registry = SchemaRegistry::standard();
        let nullable: Vec<_> = registry
            .fields()
            .iter()
            .filter(|f| f.nullable)
            .map(|f| f.name)
            .collect();
        assert_eq!(
            nullable,
            ["courseid", "ip", "objectid", "objecttable", "origin", "realuserid", "relateduserid"]
        );

        let mut record = EventRecord::new();
        for spec in registry.fields().iter().filter(|f| !f.nullable) {
            let value = match spec.field_type {
                FieldType::TextKeyword => FieldValue::Text("x".into()),
                _ => FieldValue::Int(1),
            };
            record.insert(spec.name, value);
        }
        assert!(registry.check_record(&record).is_empty());
    }

    #[test]
    fn own_mapping_passes_check() {
        let registry = SchemaRegistry::standard();
        assert!(registry.check_mapping(&registry.mapping_properties()).is_empty());
        assert!(registry.validate_mapping(&registry.mapping_properties()).is_ok());
    }

    #[test]
    fn mapping_check_reports_type_drift() {
        let registry = SchemaRegistry::standard();
        let mut properties = registry.mapping_properties();
        properties["userid"] = json!({ "type": "long" });
        properties["eventname"] = json!({ "type": "text" });
        properties["extra"] = json!({ "type": "keyword" });
        properties.as_object_mut().unwrap().remove("ip");

        let problems = registry.check_mapping(&properties);
        assert!(problems.contains(&SchemaError::MissingField("ip".into())));
        assert!(problems.contains(&SchemaError::UnexpectedField("extra".into())));
        assert!(problems.iter().any(|p| matches!(
            p,
            SchemaError::TypeMismatch { field, .. } if field == "userid"
        )));
        assert!(problems.iter().any(|p| matches!(
            p,
            SchemaError::TypeMismatch { field, .. } if field == "eventname"
        )));
    }

    #[test]
    fn complete_fills_nulls_and_drops_unknown_fields() {
        let registry = SchemaRegistry::standard();
        let mut record = EventRecord::new();
        record.insert("userid", 5i64);
        record.insert("bogus", "x");

        let complete = registry.complete(&record);
        assert_eq!(complete.len(), registry.fields().len());
        assert_eq!(complete.get("userid"), Some(&FieldValue::Int(5)));
        assert_eq!(complete.get("eventname"), Some(&FieldValue::Null));
        assert!(!complete.contains_key("bogus"));
    }

    #[test]
    fn check_record_flags_wrong_kinds() {
        let registry = SchemaRegistry::standard();
        let mut record = EventRecord::new();
        record.insert("userid", "not a number");
        let problems = registry.check_record(&record);
        assert!(problems.iter().any(|p| matches!(
            p,
            SchemaError::TypeMismatch { field, .. } if field == "userid"
        )));
        assert!(!problems.contains(&SchemaError::MissingField("realuserid".into())));
        assert!(problems.contains(&SchemaError::MissingField("eventname".into())));
    }
}
