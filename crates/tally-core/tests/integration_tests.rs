//! Integration tests for tally-core
//!
//! These tests exercise the full categorize → correct → retrain workflow
//! against the SQLite and file-backed stores.

use std::sync::Arc;

use tally_core::{
    corpus::parse_labeled_csv, Categorizer, Category, Classifier, Config, CorpusStore, Database,
    ExampleSource, FileArtifactStore,
};
use tempfile::TempDir;

fn categorizer(db: &Database, dir: &TempDir) -> Categorizer {
    Categorizer::from_config(
        &Config::default(),
        Arc::new(db.clone()),
        Arc::new(FileArtifactStore::new(dir.path().join("model.json"))),
    )
    .expect("Failed to build categorizer")
}

// =============================================================================
// Feedback Loop
// =============================================================================

#[test]
fn test_correction_survives_restart() {
    let dir = TempDir::new().unwrap();
    let db = Database::new(&dir.path().join("tally.db").to_string_lossy())
        .expect("Failed to open database");

    let engine = categorizer(&db, &dir);
    let before = engine.categorize("Gym membership").unwrap();
    assert_eq!(before.category, Category::Entertainment);

    for _ in 0..2 {
        engine.categorize("Gym membership").unwrap();
        let outcome = engine
            .record_feedback("Gym membership", "Healthcare")
            .unwrap();
        assert!(outcome.retrained || !outcome.correction);
    }
    assert!(db.count_corrections().unwrap() > 0);

    // A fresh process loads the saved artifact, which matches the stored corpus
    let restarted = categorizer(&db, &dir);
    let after = restarted.categorize("Gym membership").unwrap();
    assert!(
        after.probability_of(Category::Healthcare) > before.probability_of(Category::Healthcare)
    );
    assert_eq!(restarted.registry().generation(), 1);
    assert!(!restarted.status().unwrap().stale);
}

#[test]
fn test_shown_prediction_is_the_baseline() {
    let dir = TempDir::new().unwrap();
    let db = Database::in_memory().unwrap();
    let engine = categorizer(&db, &dir);

    let shown = engine.categorize("Clothes at Target").unwrap();
    assert_eq!(shown.category, Category::Other);
    assert_eq!(
        db.last_shown_prediction("Clothes at Target").unwrap(),
        Some(Category::Other)
    );

    let outcome = engine
        .record_feedback("Clothes at Target", "Shopping")
        .unwrap();
    assert!(outcome.correction);
    assert_eq!(outcome.shown, Category::Other);

    let stored = db.list_corrections(None).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].shown, Some(Category::Other));
    assert_eq!(stored[0].example.source, ExampleSource::Correction);
}

#[test]
fn test_corrupt_artifact_is_replaced() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("model.json"), "garbage").unwrap();

    let db = Database::in_memory().unwrap();
    let engine = categorizer(&db, &dir);
    let prediction = engine.categorize("Pharmacy prescription").unwrap();
    assert_eq!(prediction.category, Category::Healthcare);

    // Retrained model was written over the corrupt file
    let reloaded = tally_core::FittedModel::load(&dir.path().join("model.json")).unwrap();
    assert_eq!(reloaded.classes().len(), 7);
}

#[test]
fn test_unwritable_artifact_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    // A directory where the artifact file should be
    let blocked = dir.path().join("model.json");
    std::fs::create_dir_all(blocked.join("child")).unwrap();

    let db = Database::in_memory().unwrap();
    let engine = Categorizer::new(
        Classifier::default(),
        Arc::new(db),
        Arc::new(FileArtifactStore::new(&blocked)),
    );
    let prediction = engine.categorize("Taxi fare").unwrap();
    assert_eq!(prediction.category, Category::Transport);
}

// =============================================================================
// Import
// =============================================================================

#[test]
fn test_csv_import_workflow() {
    let dir = TempDir::new().unwrap();
    let db = Database::in_memory().unwrap();
    let engine = categorizer(&db, &dir);

    let csv = "description,category\nKibble and treats,Other\nDog groomer,Other\nVet clinic,Other\n";
    let examples = parse_labeled_csv(csv.as_bytes(), ExampleSource::Import).unwrap();
    assert_eq!(engine.import_examples(&examples).unwrap(), 3);

    let corpus = db.load_corpus().unwrap();
    assert_eq!(corpus.corrected().len(), 3);
    assert_eq!(corpus.stats().by_source["import"], 3);
}
