//! Host event model and the `other` payload codec.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use logsearch_schema::{EventRecord, FieldValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// One logged occurrence as the host application sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Fully qualified event name.
    pub eventname: String,
    /// Component that triggered the event.
    pub component: String,
    /// Action verb.
    pub action: String,
    /// Action target.
    pub target: String,
    /// Table of the affected object.
    #[serde(default)]
    pub objecttable: Option<String>,
    /// Id of the affected object.
    #[serde(default)]
    pub objectid: Option<i64>,
    /// One of `c`, `r`, `u`, `d`.
    pub crud: String,
    /// Educational level.
    #[serde(default)]
    pub edulevel: i64,
    /// Context the event happened in.
    pub contextid: i64,
    /// Level of that context.
    #[serde(default)]
    pub contextlevel: i64,
    /// Instance id of that context.
    #[serde(default)]
    pub contextinstanceid: i64,
    /// Acting user; zero when not logged in.
    pub userid: i64,
    /// Course the event belongs to.
    #[serde(default)]
    pub courseid: Option<i64>,
    /// User affected by the event.
    #[serde(default)]
    pub relateduserid: Option<i64>,
    /// Non-zero when the event is anonymous.
    #[serde(default)]
    pub anonymous: i64,
    /// Arbitrary structured payload.
    #[serde(default)]
    pub other: Value,
    /// Seconds since epoch.
    pub timecreated: i64,
    /// Origin of the request (`web`, `cli`, `ws`, ...).
    #[serde(default)]
    pub origin: Option<String>,
    /// Client address.
    #[serde(default)]
    pub ip: Option<String>,
    /// Real user when acting as another user.
    #[serde(default)]
    pub realuserid: Option<i64>,
}

impl LogEvent {
    /// Flattens the event into an indexable record.
    ///
    /// `other` is serialized according to `json_format`; `acutime` is not set
    /// here, the bulk writer attaches it.
    pub fn to_record(&self, json_format: bool) -> EventRecord {
        let mut record = EventRecord::new();
        record.insert("eventname", self.eventname.as_str());
        record.insert("component", self.component.as_str());
        record.insert("action", self.action.as_str());
        record.insert("target", self.target.as_str());
        record.insert("objecttable", self.objecttable.clone());
        record.insert("objectid", self.objectid);
        record.insert("crud", self.crud.as_str());
        record.insert("edulevel", self.edulevel);
        record.insert("contextid", self.contextid);
        record.insert("contextlevel", self.contextlevel);
        record.insert("contextinstanceid", self.contextinstanceid);
        record.insert("userid", self.userid);
        record.insert("courseid", self.courseid);
        record.insert("relateduserid", self.relateduserid);
        record.insert("anonymous", self.anonymous);
        record.insert("other", encode_other(&self.other, json_format));
        record.insert("timecreated", self.timecreated);
        record.insert("origin", self.origin.clone());
        record.insert("ip", self.ip.clone());
        record.insert("realuserid", self.realuserid);
        record
    }
}

/// Serializes the `other` payload for storage.
pub fn encode_other(other: &Value, json_format: bool) -> String {
    let text = other.to_string();
    if json_format {
        text
    } else {
        STANDARD.encode(text)
    }
}

/// Decodes a stored `other` payload.
///
/// Null decodes to null. Anything undecodable yields an empty object; the
/// failure is logged and never propagated.
pub fn decode_other(stored: &FieldValue, json_format: bool) -> Value {
    let text = match stored {
        FieldValue::Null => return Value::Null,
        FieldValue::Text(text) => text.as_str(),
        other => return other.to_json(),
    };
    let decoded = if json_format {
        serde_json::from_str(text).ok()
    } else {
        STANDARD
            .decode(text)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    };
    decoded.unwrap_or_else(|| {
        debug!(len = text.len(), "undecodable other payload, using empty object");
        Value::Object(Map::new())
    })
}
