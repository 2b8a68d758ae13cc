//! Personal-data discovery, export and erasure.
//!
//! Users are linked to an event through `userid`, `relateduserid` or
//! `realuserid`. Discovery pages through a composite aggregation and is not
//! bounded by the result window. Export refuses to run when the matching
//! events do not fit in one window. Erasure runs as delete-by-query.

use crate::error::StoreError;
use crate::restore::EventRestorer;
use crate::store::{prepare_row, SearchStore};
use logsearch_engine::results::{parse, parse_buckets};
use logsearch_engine::{IndexManager, QueryParams, RequestExecutor};
use logsearch_schema::FieldValue;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

/// Fields that associate a user with an event.
pub const USER_FIELDS: [&str; 3] = ["userid", "relateduserid", "realuserid"];

const USER_FILTER: &str = "(userid = ? OR relateduserid = ? OR realuserid = ?)";

const DISTINCT_AGG: &str = "distinct";

/// One exported event, with `other` decoded.
pub type ExportedEvent = Map<String, Value>;

/// Privacy operations over a [`SearchStore`].
pub struct Privacy<'a, X: RequestExecutor, R: EventRestorer> {
    store: &'a SearchStore<X, R>,
}

impl<'a, X: RequestExecutor, R: EventRestorer> Privacy<'a, X, R> {
    /// Wraps a store.
    pub fn new(store: &'a SearchStore<X, R>) -> Self {
        Self { store }
    }

    /// Contexts holding at least one event linked to `userid`.
    pub fn contexts_for_user(&self, userid: i64) -> Result<BTreeSet<i64>, StoreError> {
        let params = QueryParams::positional([userid; 3]);
        self.distinct(USER_FILTER, &params, "contextid")
    }

    /// Users linked to any event in `contextid`.
    pub fn users_in_context(&self, contextid: i64) -> Result<BTreeSet<i64>, StoreError> {
        let params = QueryParams::positional([contextid]);
        let mut users = BTreeSet::new();
        for field in USER_FIELDS {
            users.extend(self.distinct("contextid = ?", &params, field)?);
        }
        users.retain(|id| *id > 0);
        Ok(users)
    }

    /// Events linked to `userid` in the given contexts, grouped by context.
    ///
    /// Events inside a context keep creation order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ResultWindowExceeded`] when more events match
    /// than `max_result_window` lets one read return.
    pub fn export_user_data(
        &self,
        userid: i64,
        contexts: &[i64],
    ) -> Result<BTreeMap<i64, Vec<ExportedEvent>>, StoreError> {
        let mut exported: BTreeMap<i64, Vec<ExportedEvent>> = BTreeMap::new();
        if contexts.is_empty() {
            return Ok(exported);
        }
        let select = format!("{} AND contextid IN ({})", USER_FILTER, placeholders(contexts.len()));
        let params = QueryParams::positional(
            [userid; 3].into_iter().chain(contexts.iter().copied()),
        );
        let Some(spec) = self.store.count_spec(&select, &params)? else {
            return Ok(exported);
        };
        let total = parse(&self.store.search_json(&spec)?).count.unwrap_or(0);
        let window = self.store.config().max_result_window;
        if total > window {
            warn!(userid, total, window, "export does not fit in one result window");
            return Err(StoreError::ResultWindowExceeded { total, window });
        }

        let json_format = self.store.config().json_format;
        if let Some(cursor) = self.store.rows(&select, &params, "timecreated ASC", 0, 0)? {
            for row in cursor {
                let Some(contextid) = row.get("contextid").and_then(FieldValue::as_i64) else {
                    continue;
                };
                let (mut data, extra) = prepare_row(row, json_format);
                data.insert("origin".into(), json!(extra.origin));
                data.insert("ip".into(), json!(extra.ip));
                data.insert("realuserid".into(), json!(extra.realuserid));
                exported.entry(contextid).or_default().push(data);
            }
        }
        Ok(exported)
    }

    /// Erases every event linked to `userid` in the given contexts.
    ///
    /// Returns the number of deleted documents when the engine reports it.
    pub fn delete_data_for_user(&self, userid: i64, contexts: &[i64]) -> Result<Option<u64>, StoreError> {
        if contexts.is_empty() {
            return Ok(Some(0));
        }
        let should: Vec<Value> = USER_FIELDS
            .iter()
            .map(|field| json!({ "term": { *field: userid } }))
            .collect();
        self.delete(json!({
            "query": { "bool": {
                "filter": [ { "terms": { "contextid": contexts } } ],
                "should": should,
                "minimum_should_match": 1
            } }
        }))
    }

    /// Erases events in `contextid` linked to any of `userids`.
    pub fn delete_data_for_users(&self, contextid: i64, userids: &[i64]) -> Result<Option<u64>, StoreError> {
        if userids.is_empty() {
            return Ok(Some(0));
        }
        let should: Vec<Value> = USER_FIELDS
            .iter()
            .map(|field| json!({ "terms": { *field: userids } }))
            .collect();
        self.delete(json!({
            "query": { "bool": {
                "filter": [ { "term": { "contextid": contextid } } ],
                "should": should,
                "minimum_should_match": 1
            } }
        }))
    }

    /// Erases every event in `contextid`.
    pub fn delete_data_for_context(&self, contextid: i64) -> Result<Option<u64>, StoreError> {
        self.delete(json!({ "query": { "term": { "contextid": contextid } } }))
    }

    /// Distinct integer values of `field` over matching documents.
    ///
    /// Pages through a composite aggregation `batch_size` buckets at a time,
    /// so the result is not bounded by the result window.
    fn distinct(&self, select: &str, params: &QueryParams, field: &str) -> Result<BTreeSet<i64>, StoreError> {
        let mut values = BTreeSet::new();
        let Some(mut spec) = self.store.count_spec(select, params)? else {
            return Ok(values);
        };
        let page_size = self.store.config().batch_size.max(1);
        let mut after: Option<Value> = None;
        loop {
            let mut composite = json!({
                "size": page_size,
                "sources": [ { "value": { "terms": { "field": field } } } ]
            });
            if let Some(key) = after.take() {
                composite["after"] = key;
            }
            spec.body
                .insert("aggs".to_string(), json!({ DISTINCT_AGG: { "composite": composite } }));
            let page = parse_buckets(&self.store.search_json(&spec)?, DISTINCT_AGG);
            let fetched = page.keys.len() as u64;
            values.extend(page.keys.iter().filter_map(|key| key["value"].as_i64()));
            match page.after {
                Some(key) if fetched == page_size => after = Some(key),
                _ => break,
            }
        }
        debug!(field, count = values.len(), "collected distinct values");
        Ok(values)
    }

    fn delete(&self, query: Value) -> Result<Option<u64>, StoreError> {
        self.store.readiness()?;
        let deleted = IndexManager::new(self.store.config(), self.store.executor()).delete_by_query(query)?;
        info!(deleted = ?deleted, "erased personal data");
        Ok(deleted)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
