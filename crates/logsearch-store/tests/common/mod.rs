//! In-memory stand-in for the search engine.
//!
//! The fake answers the translation endpoint by echoing the SQL back inside
//! the query, and `_search` evaluates that SQL against stored documents. Only
//! the filter shapes the store emits are understood: comparisons against `?`,
//! `IN (?, ...)`, `AND`, `OR` and parentheses. Single-source composite
//! aggregations are evaluated over the filtered documents.

#![allow(dead_code)]

use logsearch_engine::{
    encode_path_segment, EngineRequest, EngineResponse, Method, RequestBody, RequestExecutor, TransportError,
};
use logsearch_schema::SchemaRegistry;
use logsearch_store::{EngineConfig, LogEvent};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;

pub const INDEX: &str = "logstore";

pub struct MemoryEngine {
    pub up: Cell<bool>,
    pub index_exists: Cell<bool>,
    pub mapping: RefCell<Value>,
    pub docs: RefCell<Vec<(String, Value)>>,
    pub requests: RefCell<Vec<(Method, String)>>,
    pub deletes: RefCell<Vec<Value>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            up: Cell::new(true),
            index_exists: Cell::new(true),
            mapping: RefCell::new(SchemaRegistry::standard().mapping_properties()),
            docs: RefCell::new(Vec::new()),
            requests: RefCell::new(Vec::new()),
            deletes: RefCell::new(Vec::new()),
        }
    }

    pub fn down() -> Self {
        let engine = Self::new();
        engine.up.set(false);
        engine
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|(m, p)| *m == method && p == path)
            .count()
    }

    pub fn search_count(&self) -> usize {
        self.count(Method::Post, &format!("/{}/_search", INDEX))
    }

    pub fn bulk_count(&self) -> usize {
        self.count(Method::Post, "/_bulk/")
    }

    pub fn insert_raw(&self, source: Value) -> String {
        let id = format!("doc{}", self.docs.borrow().len() + 1);
        self.insert_with_id(&id, source);
        id
    }

    pub fn insert_with_id(&self, id: &str, source: Value) {
        self.docs.borrow_mut().push((id.to_string(), source));
    }

    fn bulk(&self, ndjson: &str) -> Value {
        let lines: Vec<&str> = ndjson.lines().filter(|l| !l.trim().is_empty()).collect();
        let mut items = Vec::new();
        for pair in lines.chunks(2) {
            let action: Value = serde_json::from_str(pair[0]).unwrap();
            assert_eq!(action["create"]["_index"], INDEX);
            let source: Value = serde_json::from_str(pair[1]).unwrap();
            let id = self.insert_raw(source);
            items.push(json!({ "create": { "_id": id, "status": 201 } }));
        }
        json!({ "errors": false, "items": items })
    }

    fn search(&self, body: &Value) -> Value {
        let sql = body["query"]["fake_sql"]["sql"].as_str().unwrap();
        let params = body["query"]["fake_sql"]["params"].as_array().unwrap().clone();
        let query = SqlQuery::parse(sql);

        let docs = self.docs.borrow();
        let mut matched: Vec<&(String, Value)> = docs
            .iter()
            .filter(|(_, doc)| query.filter.as_ref().map_or(true, |f| f.eval(doc, &params)))
            .collect();
        matched.sort_by(|(_, a), (_, b)| query.compare(a, b));

        let total = matched.len();
        let from = body["from"].as_u64().unwrap_or(0) as usize;
        let size = body["size"].as_u64().unwrap_or(10) as usize;
        let hits: Vec<Value> = matched
            .into_iter()
            .skip(from)
            .take(size)
            .map(|(id, doc)| json!({ "_id": id, "_source": doc }))
            .collect();
        let mut response =
            json!({ "hits": { "total": { "value": total, "relation": "eq" }, "hits": hits } });
        if let Some(aggs) = body["aggs"].as_object() {
            let filtered: Vec<&Value> = docs
                .iter()
                .map(|(_, doc)| doc)
                .filter(|doc| query.filter.as_ref().map_or(true, |f| f.eval(doc, &params)))
                .collect();
            let results: serde_json::Map<String, Value> = aggs
                .iter()
                .map(|(name, agg)| (name.clone(), composite(&filtered, &agg["composite"])))
                .collect();
            response["aggregations"] = Value::Object(results);
        }
        response
    }
}

impl RequestExecutor for MemoryEngine {
    fn execute(&self, request: EngineRequest) -> Result<EngineResponse, TransportError> {
        if !self.up.get() {
            return Err(TransportError::Connect("connection refused".into()));
        }
        self.requests
            .borrow_mut()
            .push((request.method, request.path.clone()));

        let search_path = format!("/{}/_search", INDEX);
        let doc_prefix = format!("/{}/_doc/", INDEX);
        let body = match (&request.method, request.path.as_str(), &request.body) {
            (Method::Get, "/", _) => json!({ "tagline": "You Know, for Search" }),
            (Method::Get, path, _) if path == format!("/{}/_mapping", INDEX) => {
                if !self.index_exists.get() {
                    return Err(not_found());
                }
                json!({ INDEX: { "mappings": { "properties": self.mapping.borrow().clone() } } })
            }
            (Method::Put, path, _) if path == format!("/{}", INDEX) => {
                self.index_exists.set(true);
                json!({ "acknowledged": true })
            }
            (Method::Post, "/_bulk/", RequestBody::NdJson(ndjson)) => self.bulk(ndjson),
            (Method::Post, "/_sql/translate", RequestBody::Json(body)) => json!({
                "size": 1000,
                "query": { "fake_sql": { "sql": body["query"], "params": body["params"] } },
                "_source": false
            }),
            (Method::Post, path, RequestBody::Json(body)) if path == search_path => self.search(body),
            (Method::Get, path, _) if path.starts_with(&doc_prefix) => {
                let id = &path[doc_prefix.len()..];
                let docs = self.docs.borrow();
                match docs.iter().find(|(doc_id, _)| encode_path_segment(doc_id) == id) {
                    Some((id, doc)) => json!({ "_id": id, "found": true, "_source": doc }),
                    None => return Err(not_found()),
                }
            }
            (Method::Post, path, RequestBody::Json(body)) if path.contains("/_delete_by_query") => {
                self.deletes.borrow_mut().push(body.clone());
                json!({ "deleted": 0 })
            }
            (method, path, _) => panic!("unexpected request {} {}", method, path),
        };
        Ok(EngineResponse::json_response(200, &body))
    }
}

/// Evaluates a single-source composite aggregation over `docs`.
fn composite(docs: &[&Value], agg: &Value) -> Value {
    let size = agg["size"].as_u64().unwrap() as usize;
    let (source, terms) = agg["sources"][0].as_object().unwrap().iter().next().unwrap();
    let field = terms["terms"]["field"].as_str().unwrap();
    let after = agg.get("after").map(|key| key[source.as_str()].clone());

    let mut values: Vec<Value> = docs
        .iter()
        .map(|doc| doc[field].clone())
        .filter(|v| !v.is_null())
        .collect();
    values.sort_by(compare_values);
    values.dedup();
    let page: Vec<Value> = values
        .into_iter()
        .filter(|v| after.as_ref().map_or(true, |a| compare_values(v, a) == Ordering::Greater))
        .take(size)
        .collect();

    let buckets: Vec<Value> = page
        .iter()
        .map(|v| {
            let doc_count = docs.iter().filter(|doc| doc[field] == *v).count();
            json!({ "key": { source.as_str(): v }, "doc_count": doc_count })
        })
        .collect();
    let mut result = json!({ "buckets": buckets });
    if let Some(last) = page.last() {
        result["after_key"] = json!({ source.as_str(): last });
    }
    result
}

fn not_found() -> TransportError {
    TransportError::Status {
        status: 404,
        body: "{\"error\":\"index_not_found_exception\"}".into(),
    }
}

pub fn config() -> EngineConfig {
    EngineConfig::new("localhost", 9200, INDEX)
}

pub fn event(name: &str, userid: i64, contextid: i64, timecreated: i64) -> LogEvent {
    LogEvent {
        eventname: name.to_string(),
        component: "core".into(),
        action: "viewed".into(),
        target: "course".into(),
        objecttable: None,
        objectid: None,
        crud: "r".into(),
        edulevel: 2,
        contextid,
        contextlevel: 50,
        contextinstanceid: contextid,
        userid,
        courseid: Some(1),
        relateduserid: None,
        anonymous: 0,
        other: Value::Null,
        timecreated,
        origin: Some("web".into()),
        ip: Some("10.0.0.1".into()),
        realuserid: None,
    }
}

struct SqlQuery {
    filter: Option<Expr>,
    order: Vec<(String, bool)>,
}

impl SqlQuery {
    fn parse(sql: &str) -> Self {
        let mut rest = sql;
        if let Some(pos) = rest.find(" LIMIT ") {
            rest = &rest[..pos];
        }
        let mut order = Vec::new();
        if let Some(pos) = rest.find(" ORDER BY ") {
            for clause in rest[pos + " ORDER BY ".len()..].split(',') {
                let mut parts = clause.split_whitespace();
                let field = parts.next().unwrap().to_string();
                let desc = parts.next().map_or(false, |d| d.eq_ignore_ascii_case("desc"));
                order.push((field, desc));
            }
            rest = &rest[..pos];
        }
        let filter = rest.find(" WHERE ").map(|pos| {
            let mut parser = Parser {
                tokens: tokenize(&rest[pos + " WHERE ".len()..]),
                pos: 0,
                next_param: 0,
            };
            parser.or()
        });
        Self { filter, order }
    }

    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for (field, desc) in &self.order {
            let ordering = compare_values(&a[field], &b[field]);
            let ordering = if *desc { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap()
            .partial_cmp(&y.as_f64().unwrap())
            .unwrap_or(Ordering::Equal),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

enum Expr {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    Cmp(String, String, usize),
    In(String, Vec<usize>),
}

impl Expr {
    fn eval(&self, doc: &Value, params: &[Value]) -> bool {
        match self {
            Expr::Or(parts) => parts.iter().any(|p| p.eval(doc, params)),
            Expr::And(parts) => parts.iter().all(|p| p.eval(doc, params)),
            Expr::Cmp(field, op, param) => {
                let value = &doc[field.as_str()];
                if value.is_null() {
                    return false;
                }
                let ordering = compare_values(value, &params[*param]);
                match op.as_str() {
                    "=" => ordering == Ordering::Equal,
                    "<>" | "!=" => ordering != Ordering::Equal,
                    ">" => ordering == Ordering::Greater,
                    ">=" => ordering != Ordering::Less,
                    "<" => ordering == Ordering::Less,
                    "<=" => ordering != Ordering::Greater,
                    other => panic!("unsupported operator {}", other),
                }
            }
            Expr::In(field, indexes) => {
                let value = &doc[field.as_str()];
                indexes
                    .iter()
                    .any(|i| compare_values(value, &params[*i]) == Ordering::Equal)
            }
        }
    }
}

fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' | ')' | ',' | '?' | '=' => tokens.push(c.to_string()),
            '<' | '>' | '!' => {
                let mut op = c.to_string();
                while let Some(&next) = chars.peek() {
                    if next == '=' || next == '>' {
                        op.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(op);
            }
            _ => {
                let mut word = c.to_string();
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        word.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(word);
            }
        }
    }
    tokens
}

struct Parser {
    tokens: Vec<String>,
    pos: usize,
    next_param: usize,
}

impl Parser {
    fn peek_is(&self, word: &str) -> bool {
        self.tokens
            .get(self.pos)
            .map_or(false, |t| t.eq_ignore_ascii_case(word))
    }

    fn take(&mut self) -> String {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn param(&mut self) -> usize {
        assert_eq!(self.take(), "?");
        self.next_param += 1;
        self.next_param - 1
    }

    fn or(&mut self) -> Expr {
        let mut parts = vec![self.and()];
        while self.peek_is("OR") {
            self.pos += 1;
            parts.push(self.and());
        }
        Expr::Or(parts)
    }

    fn and(&mut self) -> Expr {
        let mut parts = vec![self.atom()];
        while self.peek_is("AND") {
            self.pos += 1;
            parts.push(self.atom());
        }
        Expr::And(parts)
    }

    fn atom(&mut self) -> Expr {
        if self.peek_is("(") {
            self.pos += 1;
            let inner = self.or();
            assert_eq!(self.take(), ")");
            return inner;
        }
        let field = self.take();
        if self.peek_is("IN") {
            self.pos += 1;
            assert_eq!(self.take(), "(");
            let mut indexes = vec![self.param()];
            while self.peek_is(",") {
                self.pos += 1;
                indexes.push(self.param());
            }
            assert_eq!(self.take(), ")");
            return Expr::In(field, indexes);
        }
        let op = self.take();
        Expr::Cmp(field, op, self.param())
    }
}
