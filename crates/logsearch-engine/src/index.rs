//! Index bootstrap, schema checks and delete-by-query.

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::executor::RequestExecutor;
use crate::request::{EngineRequest, RequestBody, Method};
use logsearch_schema::SchemaRegistry;
use serde_json::Value;
use tracing::{info, warn};

/// Result of comparing an index against the schema registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    /// The index does not exist.
    Missing,
    /// The index mapping matches the registry exactly.
    Compatible,
    /// The index exists with a different mapping; one entry per problem.
    Incompatible(Vec<String>),
}

/// Manages the event index.
pub struct IndexManager<'a, X: RequestExecutor + ?Sized> {
    config: &'a EngineConfig,
    executor: &'a X,
    registry: SchemaRegistry,
}

impl<'a, X: RequestExecutor + ?Sized> IndexManager<'a, X> {
    /// Creates a manager for the configured index.
    pub fn new(config: &'a EngineConfig, executor: &'a X) -> Self {
        Self {
            config,
            executor,
            registry: SchemaRegistry::standard(),
        }
    }

    /// Fetches the `properties` object of the index mapping.
    ///
    /// Returns `Ok(None)` when the index does not exist.
    pub fn mapping(&self) -> Result<Option<Value>, EngineError> {
        let index = self.config.require_index()?;
        match self
            .executor
            .execute(EngineRequest::get(format!("/{}/_mapping", index)))
        {
            Ok(response) => {
                let body = response.json()?;
                // The answer is keyed by the concrete index name, which differs
                // from the configured one when it is an alias.
                let properties = body
                    .as_object()
                    .and_then(|indices| indices.values().next())
                    .and_then(|entry| entry.pointer("/mappings/properties"))
                    .cloned()
                    .unwrap_or_else(|| Value::Object(Default::default()));
                Ok(Some(properties))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns true when the index exists.
    pub fn exists(&self) -> Result<bool, EngineError> {
        Ok(self.mapping()?.is_some())
    }

    /// Compares the index mapping against the registry.
    pub fn check(&self) -> Result<IndexStatus, EngineError> {
        let Some(properties) = self.mapping()? else {
            return Ok(IndexStatus::Missing);
        };
        let problems = self.registry.check_mapping(&properties);
        if problems.is_empty() {
            return Ok(IndexStatus::Compatible);
        }
        for problem in &problems {
            warn!(index = %self.config.index, %problem, "index mapping mismatch");
        }
        Ok(IndexStatus::Incompatible(
            problems.iter().map(ToString::to_string).collect(),
        ))
    }

    /// Creates the index with the registry's mapping.
    pub fn create(&self) -> Result<(), EngineError> {
        let index = self.config.require_index()?;
        self.executor
            .execute(EngineRequest::put_json(format!("/{}", index), self.registry.index_body()))?;
        info!(index, "created index");
        Ok(())
    }

    /// Creates the index when missing and reports whether it is usable.
    pub fn ensure(&self) -> Result<IndexStatus, EngineError> {
        match self.check()? {
            IndexStatus::Missing => {
                self.create()?;
                self.check()
            }
            status => Ok(status),
        }
    }

    /// Removes every document matching `query`.
    ///
    /// Returns the number of deleted documents when the engine reports it.
    pub fn delete_by_query(&self, query: Value) -> Result<Option<u64>, EngineError> {
        let index = self.config.require_index()?;
        let request = EngineRequest {
            method: Method::Post,
            path: format!("/{}/_delete_by_query?conflicts=proceed", index),
            body: RequestBody::Json(query),
        };
        let response = self.executor.execute(request)?;
        let deleted = response.json()?.get("deleted").and_then(Value::as_u64);
        info!(index, ?deleted, "delete by query");
        Ok(deleted)
    }
}
