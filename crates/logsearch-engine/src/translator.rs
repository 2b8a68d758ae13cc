//! Translation of relational filter/sort/limit requests into engine queries.
//!
//! The engine has no OFFSET in its SQL dialect, so the translator asks the
//! engine to turn `SELECT ... WHERE ... ORDER BY ... LIMIT` into a native
//! query body and then writes `from` onto the result itself.

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::executor::RequestExecutor;
use crate::request::EngineRequest;
use logsearch_schema::FieldValue;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

/// Values bound to the placeholders of a filter expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryParams {
    /// No placeholders.
    #[default]
    None,
    /// Values for `?` (or `$n`) placeholders, in order.
    Positional(Vec<FieldValue>),
    /// Values for `:name` placeholders.
    Named(BTreeMap<String, FieldValue>),
}

impl QueryParams {
    /// Positional parameters from anything convertible to field values.
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        QueryParams::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Named parameters from `(name, value)` pairs.
    pub fn named<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        QueryParams::Named(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A native engine query with its paging attributes lifted out.
///
/// `size` and `from` are kept apart from the opaque predicate/sort body so a
/// cursor can rewrite them per page without touching anything else.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Total number of records the caller wants.
    pub size: u64,
    /// Offset of the first record.
    pub from: u64,
    /// Everything else in the query body.
    pub body: Map<String, Value>,
}

impl QuerySpec {
    /// Splits a native query body into paging attributes and the rest.
    ///
    /// A missing `size` falls back to `default_size`, a missing `from` to zero.
    pub fn from_body(body: Value, default_size: u64) -> Result<Self, EngineError> {
        let Value::Object(mut body) = body else {
            return Err(EngineError::UnexpectedResponse(
                "query body is not an object".to_string(),
            ));
        };
        let size = take_u64(&mut body, "size")?.unwrap_or(default_size);
        let from = take_u64(&mut body, "from")?.unwrap_or(0);
        Ok(Self { size, from, body })
    }

    /// The full query body.
    pub fn to_body(&self) -> Value {
        self.page_body(self.from, self.size)
    }

    /// The query body for one page.
    pub fn page_body(&self, from: u64, size: u64) -> Value {
        let mut body = self.body.clone();
        body.insert("size".to_string(), Value::from(size));
        body.insert("from".to_string(), Value::from(from));
        Value::Object(body)
    }
}

fn take_u64(body: &mut Map<String, Value>, key: &str) -> Result<Option<u64>, EngineError> {
    match body.remove(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            EngineError::UnexpectedResponse(format!("{} is not a non-negative integer: {}", key, value))
        }),
    }
}

/// Rewrites `:name` and `$n` placeholders to `?` and orders the values to match.
///
/// Placeholders inside single-quoted literals are left alone.
///
/// # Errors
///
/// Returns [`EngineError::Configuration`] when a placeholder has no value or
/// the number of positional values does not match the number of `?`.
pub fn normalize_params(
    sql: &str,
    params: &QueryParams,
) -> Result<(String, Vec<FieldValue>), EngineError> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut next_positional = 0usize;
    let mut in_quote = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            in_quote = !in_quote;
            out.push(c);
            i += 1;
            continue;
        }
        if in_quote {
            out.push(c);
            i += 1;
            continue;
        }
        match c {
            '?' => {
                let value = match params {
                    QueryParams::Positional(list) => list.get(next_positional).cloned(),
                    _ => None,
                }
                .ok_or_else(|| {
                    EngineError::config(format!("no value for placeholder ? #{}", next_positional + 1))
                })?;
                next_positional += 1;
                values.push(value);
                out.push('?');
                i += 1;
            }
            ':' if chars.get(i + 1).is_some_and(|n| n.is_ascii_alphabetic() || *n == '_')
                && (i == 0 || chars[i - 1] != ':') =>
            {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && (chars[end].is_ascii_alphanumeric() || chars[end] == '_') {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let value = match params {
                    QueryParams::Named(map) => map.get(&name).cloned(),
                    _ => None,
                }
                .ok_or_else(|| EngineError::config(format!("no value for placeholder :{}", name)))?;
                values.push(value);
                out.push('?');
                i = end;
            }
            '$' if chars.get(i + 1).is_some_and(char::is_ascii_digit) => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && chars[end].is_ascii_digit() {
                    end += 1;
                }
                let digits: String = chars[start..end].iter().collect();
                let position: usize = digits
                    .parse()
                    .map_err(|_| EngineError::config(format!("bad placeholder ${}", digits)))?;
                let value = match params {
                    QueryParams::Positional(list) if position > 0 => list.get(position - 1).cloned(),
                    _ => None,
                }
                .ok_or_else(|| EngineError::config(format!("no value for placeholder ${}", digits)))?;
                values.push(value);
                out.push('?');
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    if let QueryParams::Positional(list) = params {
        if next_positional > 0 && next_positional != list.len() {
            return Err(EngineError::config(format!(
                "{} positional values for {} placeholders",
                list.len(),
                next_positional
            )));
        }
    }
    Ok((out, values))
}

fn plain_identifier() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid regex"))
}

/// Renders an index name for the `FROM` clause, quoting it when needed.
pub fn quote_index(index: &str) -> String {
    if plain_identifier().is_match(index) {
        index.to_string()
    } else {
        format!("\"{}\"", index.replace('"', "\"\""))
    }
}

/// Turns relational read requests into native engine queries.
///
/// # Example
///
/// ```rust,no_run
/// use logsearch_engine::{EngineConfig, HttpExecutor, QueryParams, QueryTranslator};
///
/// let config = EngineConfig::new("localhost", 9200, "logstore");
/// let executor = HttpExecutor::new(&config)?;
/// let translator = QueryTranslator::new(&config, &executor);
/// let spec = translator.prepare_query(
///     "userid = ?",
///     &QueryParams::positional([5i64]),
///     Some("timecreated DESC, acutime DESC"),
///     Some(20),
///     Some(10),
/// )?;
/// assert_eq!(spec.from, 20);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct QueryTranslator<'a, X: RequestExecutor + ?Sized> {
    config: &'a EngineConfig,
    executor: &'a X,
}

impl<'a, X: RequestExecutor + ?Sized> QueryTranslator<'a, X> {
    /// Creates a translator for the configured index.
    pub fn new(config: &'a EngineConfig, executor: &'a X) -> Self {
        Self { config, executor }
    }

    /// Builds the relational statement sent for translation.
    pub fn build_sql(
        &self,
        filter: &str,
        sort: Option<&str>,
        limit: Option<u64>,
    ) -> Result<String, EngineError> {
        let index = self.config.require_index()?;
        let mut sql = format!("SELECT * FROM {}", quote_index(index));
        let filter = filter.trim();
        if !filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        if let Some(sort) = sort.map(str::trim).filter(|s| !s.is_empty()) {
            sql.push_str(" ORDER BY ");
            sql.push_str(sort);
        }
        if let Some(limit) = limit.filter(|l| *l > 0) {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        Ok(sql)
    }

    /// Translates a filter, sort and page window into a native query.
    ///
    /// `offset` is applied as a top-level `from` after translation and the
    /// body always requests the stored source document. A zero or absent
    /// `limit` means "no limit" and yields `size = max_result_window`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if the index name is unset or the
    /// parameters do not fit the filter, and a transport error if the
    /// translation request fails.
    pub fn prepare_query(
        &self,
        filter: &str,
        params: &QueryParams,
        sort: Option<&str>,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<QuerySpec, EngineError> {
        let limit = limit.filter(|l| *l > 0);
        let sql = self.build_sql(filter, sort, limit)?;
        let mut spec = self.translate(&sql, params)?;
        spec.size = limit.unwrap_or(self.config.max_result_window);
        spec.from = offset.unwrap_or(0);
        spec.body.insert("_source".to_string(), Value::Bool(true));
        Ok(spec)
    }

    /// Translates a filter into a query that only counts matches.
    pub fn prepare_count(&self, filter: &str, params: &QueryParams) -> Result<QuerySpec, EngineError> {
        let sql = self.build_sql(filter, None, None)?;
        let mut spec = self.translate(&sql, params)?;
        spec.size = 0;
        spec.from = 0;
        spec.body.remove("sort");
        spec.body.insert("track_total_hits".to_string(), Value::Bool(true));
        Ok(spec)
    }

    fn translate(&self, sql: &str, params: &QueryParams) -> Result<QuerySpec, EngineError> {
        let (sql, values) = normalize_params(sql, params)?;
        debug!(sql = %sql, params = values.len(), "translating query");
        let body = json!({
            "query": sql,
            "params": values.iter().map(FieldValue::to_json).collect::<Vec<_>>(),
        });
        let response = self
            .executor
            .execute(EngineRequest::post_json("/_sql/translate", body))?;
        QuerySpec::from_body(response.json()?, self.config.max_result_window)
    }
}
