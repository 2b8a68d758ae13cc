//! Logsearch CLI - inspect and maintain a search-engine backed log store.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{contexts, count, create_index, insert, purge, select, status};

#[derive(Parser)]
#[command(name = "logsearch")]
#[command(about = "Search-engine log store operations CLI")]
struct Cli {
    /// Path to the JSON adapter configuration
    #[arg(long, short, default_value = "logsearch.json")]
    config: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the engine is reachable and the index usable
    Status,
    /// Create the index with the event mapping if it does not exist
    CreateIndex,
    /// Insert NDJSON events
    Insert {
        /// Input file (or stdin if not provided)
        input: Option<String>,
    },
    /// List events matching a filter
    Select {
        /// Filter with `?` placeholders
        #[arg(long = "where", default_value = "")]
        filter: String,
        /// Placeholder value, repeatable
        #[arg(long = "param")]
        params: Vec<String>,
        /// Sort clause
        #[arg(long, default_value = "timecreated DESC")]
        sort: String,
        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        from: u64,
        /// Maximum rows (0 means no limit)
        #[arg(long, default_value_t = 100)]
        limit: u64,
        /// Output as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Count events matching a filter
    Count {
        /// Filter with `?` placeholders
        #[arg(long = "where", default_value = "")]
        filter: String,
        /// Placeholder value, repeatable
        #[arg(long = "param")]
        params: Vec<String>,
    },
    /// List contexts holding events of a user
    Contexts {
        /// User id
        #[arg(long)]
        user: i64,
    },
    /// Erase events of a user
    Purge {
        /// User id
        #[arg(long)]
        user: i64,
        /// Restrict to these contexts (default: every context of the user)
        #[arg(long = "context")]
        contexts: Vec<i64>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,logsearch_engine=info,logsearch_store=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Status => status::run(&config),
        Commands::CreateIndex => create_index::run(&config),
        Commands::Insert { input } => insert::run(&config, input),
        Commands::Select {
            filter,
            params,
            sort,
            from,
            limit,
            json,
        } => select::run(&config, &filter, &params, &sort, from, limit, json),
        Commands::Count { filter, params } => count::run(&config, &filter, &params),
        Commands::Contexts { user } => contexts::run(&config, user),
        Commands::Purge { user, contexts } => purge::run(&config, user, &contexts),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
