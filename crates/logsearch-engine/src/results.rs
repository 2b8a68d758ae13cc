//! Flattening of search responses into rows.

use logsearch_schema::{FieldValue, Row};
use serde_json::Value;

/// Rows and total count extracted from one search response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Hits in engine order, flattened to their source documents.
    pub rows: Vec<Row>,
    /// Total number of matches, when the response reports one.
    pub count: Option<u64>,
}

impl ResultSet {
    /// Returns true when no rows were returned.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parses a search response.
///
/// Missing sections are not errors: a response without hits yields no rows,
/// one without a total yields `count = None`. The hit's `_id` is kept as the
/// row's `id` unless the source already has one.
pub fn parse(response: &Value) -> ResultSet {
    let rows = response
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .map(|hits| hits.iter().filter_map(flatten_hit).collect())
        .unwrap_or_default();

    let count = match response.pointer("/hits/total") {
        Some(Value::Object(total)) => total.get("value").and_then(Value::as_u64),
        // Older engines report the total as a bare number.
        Some(total) => total.as_u64(),
        None => None,
    };

    ResultSet { rows, count }
}

/// Parses a single-document response (`GET /{index}/_doc/{id}`).
///
/// Returns `None` when the document was not found.
pub fn parse_document(response: &Value) -> Option<Row> {
    if response.get("found").and_then(Value::as_bool) == Some(false) {
        return None;
    }
    flatten_hit(response)
}

/// One page of a composite aggregation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketPage {
    /// Bucket keys in engine order.
    pub keys: Vec<Value>,
    /// Key to resume after; absent once the aggregation is exhausted.
    pub after: Option<Value>,
}

/// Reads the composite aggregation `name` from a search response.
pub fn parse_buckets(response: &Value, name: &str) -> BucketPage {
    let Some(agg) = response.pointer(&format!("/aggregations/{}", name)) else {
        return BucketPage::default();
    };
    let keys = agg
        .get("buckets")
        .and_then(Value::as_array)
        .map(|buckets| buckets.iter().filter_map(|b| b.get("key").cloned()).collect())
        .unwrap_or_default();
    let after = agg.get("after_key").filter(|k| !k.is_null()).cloned();
    BucketPage { keys, after }
}

fn flatten_hit(hit: &Value) -> Option<Row> {
    let source = hit.get("_source")?.as_object()?;
    let mut row = Row::from_json_object(source.clone());
    if !row.contains_key("id") {
        if let Some(id) = hit.get("_id").and_then(Value::as_str) {
            row.insert("id", FieldValue::Text(id.to_string()));
        }
    }
    Some(row)
}
