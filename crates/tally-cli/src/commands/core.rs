//! Shared utilities for opening storage and building the engine

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tally_core::{Categorizer, Config, Database, FileArtifactStore};

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    Config::load(config_path).context("Failed to load configuration")
}

/// Build the categorizer over the SQLite corpus and a file artifact
pub fn open_engine(
    db_path: &Path,
    model_path: &Path,
    config_path: Option<&Path>,
) -> Result<Categorizer> {
    let config = load_config(config_path)?;
    let db = open_db(db_path)?;
    Categorizer::from_config(
        &config,
        Arc::new(db),
        Arc::new(FileArtifactStore::new(model_path)),
    )
    .context("Failed to build categorizer")
}
