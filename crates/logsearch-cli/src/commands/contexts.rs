//! Contexts command implementation.

use super::open_store;
use logsearch_store::Privacy;

pub fn run(config_path: &str, user: i64) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config_path)?;
    store.readiness()?;
    for contextid in Privacy::new(&store).contexts_for_user(user)? {
        println!("{}", contextid);
    }
    Ok(())
}
