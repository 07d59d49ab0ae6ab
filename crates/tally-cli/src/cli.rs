//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Learn to categorize your expenses
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Expense categorization that learns from your corrections", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (stores corrections and shown predictions)
    #[arg(long, default_value = "tally.db", global = true)]
    pub db: PathBuf,

    /// Model artifact path
    #[arg(long, default_value = "tally-model.json", global = true)]
    pub model: PathBuf,

    /// Config file (defaults to ~/.local/share/tally/config/tally.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Predict the category of an expense description
    Categorize {
        /// Expense description, e.g. "Uber ride to airport"
        description: String,

        /// Print the full prediction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Confirm or correct the category of a description
    ///
    /// If the confirmed category differs from what was last shown for this
    /// description, it is stored as a correction and the model retrains.
    Feedback {
        /// Expense description
        description: String,

        /// Confirmed category
        category: String,

        /// Category that was shown (defaults to the last stored prediction)
        #[arg(long)]
        shown: Option<String>,
    },

    /// Retrain the model from seed data plus stored corrections
    Train,

    /// Measure accuracy
    Eval {
        /// Labeled CSV (description,category) to score instead of the built-in benchmark
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Hold out this fraction of the corpus per category, train on the rest, and score it
        #[arg(long, conflicts_with = "file")]
        holdout: Option<f64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import labeled examples from CSV (description,category) and retrain
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the normalized form of a description
    Normalize {
        /// Text to normalize
        text: String,
    },

    /// List categories
    Categories,

    /// Show the active brand/vendor rewrite table
    Rules,

    /// Show model, corpus and storage status
    Status {
        /// Print status as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored corrections
    Corrections {
        /// Number of most recent corrections to show
        #[arg(short, long, default_value = "20")]
        limit: i64,
    },
}
