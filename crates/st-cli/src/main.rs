use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use st_cli::commands::{categories, ingest, report, status};
use st_cli::{CategoryAction, Cli, Commands, Config};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(st_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = st_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match &cli.command {
        Some(Commands::Ingest) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let summary = ingest::run(&mut db, &config)?;
            println!("{summary}");
        }
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut io::stdout(), &db, &config.database_path)?;
        }
        Some(Commands::Report { device, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            report::run(&mut io::stdout(), &db, device.as_deref(), *json)?;
        }
        Some(Commands::Category { action }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            match action {
                CategoryAction::List => categories::list(&mut io::stdout(), &db)?,
                CategoryAction::Set {
                    app,
                    category,
                    alias,
                } => categories::set(&db, app, category, alias.as_deref())?,
                CategoryAction::Missing => categories::missing(&mut io::stdout(), &db)?,
            }
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
