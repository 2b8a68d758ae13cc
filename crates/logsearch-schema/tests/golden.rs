use logsearch_schema::{EventRecord, FieldValue, SchemaRegistry};
use serde_json::json;

#[test]
fn index_body_matches_expected_mapping() {
    let body = SchemaRegistry::standard().index_body();
    let properties = &body["mappings"]["properties"];

    assert_eq!(
        properties["eventname"],
        json!({
            "type": "text",
            "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
        })
    );
    assert_eq!(properties["acutime"], json!({ "type": "long" }));
    assert_eq!(properties["timecreated"], json!({ "type": "long" }));
    assert_eq!(properties["userid"], json!({ "type": "integer" }));
    assert_eq!(properties["relateduserid"], json!({ "type": "integer" }));
    assert_eq!(properties["objectid"], json!({ "type": "integer" }));
    assert_eq!(properties["realuserid"], json!({ "type": "long" }));
    assert_eq!(properties.as_object().unwrap().len(), 21);
}

#[test]
fn engine_document_round_trips_through_record() {
    let source = json!({
        "eventname": "\\core\\event\\course_viewed",
        "userid": 5,
        "relateduserid": null,
        "other": "{\"a\":1}",
        "acutime": 1700000000123i64
    });
    let record = EventRecord::from_json_object(source.as_object().unwrap().clone());

    assert_eq!(record.get("userid"), Some(&FieldValue::Int(5)));
    assert_eq!(record.get("relateduserid"), Some(&FieldValue::Null));
    assert_eq!(record.to_json(), source);
}
