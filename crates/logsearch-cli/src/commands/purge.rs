//! Purge command implementation.

use super::open_store;
use logsearch_store::Privacy;

pub fn run(config_path: &str, user: i64, contexts: &[i64]) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(config_path)?;
    store.readiness()?;
    let privacy = Privacy::new(&store);

    let contexts: Vec<i64> = if contexts.is_empty() {
        privacy.contexts_for_user(user)?.into_iter().collect()
    } else {
        contexts.to_vec()
    };
    if contexts.is_empty() {
        println!("no events for user {}", user);
        return Ok(());
    }

    match privacy.delete_data_for_user(user, &contexts)? {
        Some(deleted) => println!("deleted {} events in {} contexts", deleted, contexts.len()),
        None => println!("delete requested in {} contexts", contexts.len()),
    }
    Ok(())
}
