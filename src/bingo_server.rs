// src/bingo_server.rs
// Entry point for the bingo card API server.
//
// Loads conf/server.conf (or the file given with --config), applies command
// line overrides, opens the SQLite store and serves the HTTP API until Ctrl+C.

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use bingo::actions::BingoService;
use bingo::config::{ServerConfig, SERVER_CONFIG_PATH};
use bingo::logging::{log_error_stderr, log_info, set_log_level, LogLevel};
use bingo::server;
use bingo::store::Database;

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Bingo card server - games, items, card generation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Configuration file
    #[arg(long, default_value = SERVER_CONFIG_PATH)]
    config: PathBuf,

    /// Override the listening port
    #[arg(long)]
    port: Option<u16>,

    /// Override the SQLite database path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Override the log level (debug, info, warning, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let mut config = ServerConfig::load_from_or_default(&args.config);
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(level) = args.log_level.as_deref() {
        match LogLevel::parse(level) {
            Some(level) => config.log_level = level,
            None => log_error_stderr(&format!("Unknown log level '{level}', keeping {:?}", config.log_level)),
        }
    }
    set_log_level(config.log_level);

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                log_error_stderr(&format!("Failed to create {}: {e}", parent.display()));
                std::process::exit(1);
            }
        }
    }

    let db = match Database::open(&config.database_path) {
        Ok(db) => db,
        Err(e) => {
            log_error_stderr(&format!("Failed to open database {}: {e}", config.database_path.display()));
            std::process::exit(1);
        }
    };
    log_info(&format!("Using database {}", config.database_path.display()));

    let service = BingoService::new(db, config.plan_limits());
    let handle = server::start_server(config, service);

    if let Err(e) = handle.await {
        log_error_stderr(&format!("Error waiting for server shutdown: {e:?}"));
    }
}
