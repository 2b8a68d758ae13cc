//! Subcommand implementations.

pub mod contexts;
pub mod count;
pub mod create_index;
pub mod insert;
pub mod purge;
pub mod select;
pub mod status;

use logsearch_engine::HttpExecutor;
use logsearch_schema::FieldValue;
use logsearch_store::{EngineConfig, QueryParams, SearchStore, Session};

/// Loads the configuration file and opens a store for a command-line session.
pub fn open_store(config_path: &str) -> Result<SearchStore<HttpExecutor>, Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    Ok(SearchStore::connect(config, Session::cli())?)
}

/// Loads and validates the configuration file.
pub fn load_config(config_path: &str) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config = EngineConfig::from_file(config_path)
        .map_err(|e| format!("Failed to load config {}: {}", config_path, e))?;
    config.validate()?;
    Ok(config)
}

/// Turns `--param` values into positional parameters.
///
/// Values that parse as integers are bound as integers, anything else as text.
pub fn parse_params(raw: &[String]) -> QueryParams {
    if raw.is_empty() {
        return QueryParams::None;
    }
    QueryParams::positional(raw.iter().map(|value| match value.parse::<i64>() {
        Ok(number) => FieldValue::Int(number),
        Err(_) => FieldValue::Text(value.clone()),
    }))
}
