//! Status command implementation.

use super::open_store;

pub fn run(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config_path)?;
    store.readiness()?;
    let config = store.config();
    println!("ready: index {} at {}", config.index, config.base_url());
    Ok(())
}
