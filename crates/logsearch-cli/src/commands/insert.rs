//! Insert command implementation.

use super::open_store;
use logsearch_store::{LogEvent, LogWriter};
use std::io::{self, Read};

pub fn run(config_path: &str, input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    // Read NDJSON from file or stdin
    let text = if let Some(path) = input {
        std::fs::read_to_string(&path).map_err(|e| format!("Failed to read file {}: {}", path, e))?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let mut events = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: LogEvent = serde_json::from_str(line)
            .map_err(|e| format!("Invalid event on line {}: {}", number + 1, e))?;
        events.push(event);
    }

    let mut store = open_store(config_path)?;
    store.readiness()?;
    for event in &events {
        store.write(event)?;
    }
    store.flush()?;
    println!("inserted {} events", events.len());
    Ok(())
}
