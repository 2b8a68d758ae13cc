//! Create-index command implementation.

use super::load_config;
use logsearch_engine::{HttpExecutor, IndexManager, IndexStatus};

pub fn run(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let executor = HttpExecutor::new(&config)?;
    match IndexManager::new(&config, &executor).ensure()? {
        IndexStatus::Compatible => {
            println!("index {} ready", config.index);
            Ok(())
        }
        IndexStatus::Missing => Err(format!("index {} could not be created", config.index).into()),
        IndexStatus::Incompatible(problems) => Err(format!(
            "index {} exists with an incompatible mapping:\n  {}",
            config.index,
            problems.join("\n  ")
        )
        .into()),
    }
}
