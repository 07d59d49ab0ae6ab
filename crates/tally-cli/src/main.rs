//! Tally CLI - Expense categorization that learns from corrections
//!
//! Usage:
//!   tally categorize "Uber ride to airport"   Predict a category
//!   tally feedback "Gym membership" Healthcare  Correct a prediction
//!   tally train                                 Retrain from seed + corrections
//!   tally eval                                  Score the benchmark battery

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let open_engine = || commands::open_engine(&cli.db, &cli.model, cli.config.as_deref());

    match cli.command {
        Commands::Categorize {
            ref description,
            json,
        } => commands::cmd_categorize(&open_engine()?, description, json),
        Commands::Feedback {
            ref description,
            ref category,
            ref shown,
        } => commands::cmd_feedback(&open_engine()?, description, category, shown.as_deref()),
        Commands::Train => commands::cmd_train(&open_engine()?),
        Commands::Eval {
            ref file,
            holdout,
            json,
        } => commands::cmd_eval(&open_engine()?, file.as_deref(), holdout, json),
        Commands::Import { ref file } => commands::cmd_import(&open_engine()?, file),
        Commands::Status { json } => commands::cmd_status(&open_engine()?, json),
        Commands::Corrections { limit } => {
            commands::cmd_corrections(&commands::open_db(&cli.db)?, limit)
        }
        Commands::Normalize { ref text } => {
            commands::cmd_normalize(&commands::load_config(cli.config.as_deref())?, text)
        }
        Commands::Rules => commands::cmd_rules(&commands::load_config(cli.config.as_deref())?),
        Commands::Categories => commands::cmd_categories(),
    }
}
