//! Rebuilding host events from stored rows.

use crate::error::RestoreError;
use crate::event::LogEvent;
use serde_json::{Map, Value};

/// Fields carried outside the event's own data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreExtra {
    /// Request origin.
    pub origin: Option<String>,
    /// Client address.
    pub ip: Option<String>,
    /// Real user when acting as another user.
    pub realuserid: Option<i64>,
}

/// Turns a prepared row into a host event.
///
/// `data` holds the stored fields with `other` already decoded and without
/// `id`, `acutime` or the [`RestoreExtra`] fields.
pub trait EventRestorer {
    /// Event type produced.
    type Event;

    /// Rebuilds one event. Errors cause the row to be skipped.
    fn restore(&self, data: Map<String, Value>, extra: RestoreExtra)
        -> Result<Self::Event, RestoreError>;
}

/// Restores rows into [`LogEvent`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRestorer;

impl EventRestorer for StandardRestorer {
    type Event = LogEvent;

    fn restore(
        &self,
        data: Map<String, Value>,
        extra: RestoreExtra,
    ) -> Result<LogEvent, RestoreError> {
        let mut event: LogEvent = serde_json::from_value(Value::Object(data))?;
        if event.eventname.trim().is_empty() {
            return Err(RestoreError::Invalid("empty eventname".into()));
        }
        event.origin = extra.origin;
        event.ip = extra.ip;
        event.realuserid = extra.realuserid;
        Ok(event)
    }
}
