//! Count command implementation.

use super::{open_store, parse_params};
use logsearch_store::LogReader;

pub fn run(config_path: &str, filter: &str, params: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config_path)?;
    store.readiness()?;
    let count = store.get_events_select_count(filter, &parse_params(params))?;
    println!("{}", count);
    Ok(())
}
