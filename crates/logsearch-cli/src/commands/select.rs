//! Select command implementation.

use super::{open_store, parse_params};
use crate::output;
use logsearch_store::LogReader;

pub fn run(
    config_path: &str,
    filter: &str,
    params: &[String],
    sort: &str,
    from: u64,
    limit: u64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config_path)?;
    store.readiness()?;
    let params = parse_params(params);

    // Output header if table format
    if !json {
        output::print_table_header();
    }

    for event in store.get_events_select_iterator(filter, &params, sort, from, limit)? {
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            println!("{}", output::format_table_row(&event));
        }
    }

    Ok(())
}
