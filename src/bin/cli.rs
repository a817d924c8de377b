//! SlotKV CLI
//!
//! Command-line interface over a local SlotKV file.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use slotkv::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// SlotKV CLI
#[derive(Parser, Debug)]
#[command(name = "slotkv-cli")]
#[command(about = "CLI for the SlotKV embedded key-value store")]
#[command(version)]
struct Args {
    /// Store file
    #[arg(short, long, default_value = "./slotkv.db")]
    path: String,

    /// Expiration poll interval in milliseconds
    #[arg(long, default_value = "1000")]
    poll_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a new key
    Put {
        /// The key to write
        key: String,

        /// The value to store
        value: String,

        /// Seconds until the key expires (0 = never)
        #[arg(long, default_value = "0")]
        ttl: u32,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Print every live key and value
    List,

    /// Print the number of live records
    Count,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,slotkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .path(&args.path)
        .poll_interval(Duration::from_millis(args.poll_ms))
        .build();

    let engine = match Engine::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open store {}: {}", args.path, e);
            return ExitCode::FAILURE;
        }
    };

    let result = run(&engine, args.command);

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close store: {}", e);
        return ExitCode::FAILURE;
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(engine: &Engine<slotkv::FileStore>, command: Commands) -> slotkv::Result<()> {
    match command {
        Commands::Put { key, value, ttl } => {
            engine.write_with_ttl(key.as_bytes(), value.as_bytes(), ttl)?;
            println!("OK");
        }
        Commands::Get { key } => {
            let value = engine.read(key.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Commands::Del { key } => {
            engine.delete(key.as_bytes())?;
            println!("OK");
        }
        Commands::List => {
            for (key, value) in engine.get_all()? {
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&value)
                );
            }
        }
        Commands::Count => {
            println!("{}", engine.len());
        }
    }
    Ok(())
}
