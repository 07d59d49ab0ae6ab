//! Database tests

use super::*;
use crate::corpus::CorpusStore;
use crate::models::*;
use crate::seed::seed_examples;

fn prediction(category: Category, confidence: f64) -> Prediction {
    Prediction {
        category,
        confidence,
        raw_category: category,
        fallback: false,
        probabilities: vec![],
    }
}

#[test]
fn test_in_memory_db() {
    let db = Database::in_memory().unwrap();
    assert_eq!(db.count_corrections().unwrap(), 0);
    assert!(db.list_corrections(None).unwrap().is_empty());
}

#[test]
fn test_insert_and_list_corrections() {
    let db = Database::in_memory().unwrap();

    let id = db
        .insert_correction(
            &LabeledExample::correction("Gym membership", Category::Healthcare),
            Some(Category::Entertainment),
        )
        .unwrap();
    assert!(id > 0);
    db.insert_correction(
        &LabeledExample::new("Ferry ticket", Category::Transport, ExampleSource::Import),
        None,
    )
    .unwrap();

    let rows = db.list_corrections(None).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].example.text, "Gym membership");
    assert_eq!(rows[0].example.category, Category::Healthcare);
    assert_eq!(rows[0].example.source, ExampleSource::Correction);
    assert_eq!(rows[0].shown, Some(Category::Entertainment));
    assert_eq!(rows[1].example.source, ExampleSource::Import);
    assert_eq!(rows[1].shown, None);

    // Limit keeps the newest rows, still oldest first
    let recent = db.list_corrections(Some(1)).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].example.text, "Ferry ticket");
}

#[test]
fn test_load_corpus_includes_seed() {
    let db = Database::in_memory().unwrap();
    db.append_corrected_example(
        &LabeledExample::correction("Costco membership", Category::Food),
        Some(Category::Shopping),
    )
    .unwrap();

    let corpus = db.load_corpus().unwrap();
    assert_eq!(corpus.seed().len(), seed_examples().len());
    assert_eq!(corpus.corrected().len(), 1);
    assert_eq!(corpus.corrected()[0].text, "Costco membership");
}

#[test]
fn test_unknown_stored_category_is_skipped() {
    let db = Database::in_memory().unwrap();
    db.insert_correction(&LabeledExample::correction("Ferry ticket", Category::Transport), None)
        .unwrap();
    db.conn()
        .unwrap()
        .execute(
            "INSERT INTO corrected_examples (description, category) VALUES ('Dog groomer', 'pets')",
            [],
        )
        .unwrap();
    assert_eq!(db.count_corrections().unwrap(), 2);

    let corrections = db.list_corrections(None).unwrap();
    assert_eq!(corrections.len(), 1);
    assert_eq!(corrections[0].example.text, "Ferry ticket");

    let corpus = db.load_corpus().unwrap();
    assert_eq!(corpus.corrected().len(), 1);
    assert!(corpus.iter().all(|e| e.text != "Dog groomer"));
}

#[test]
fn test_shown_prediction_upsert() {
    let db = Database::in_memory().unwrap();
    assert_eq!(db.last_shown_prediction("Gym membership").unwrap(), None);

    db.record_shown_prediction("Gym membership", &prediction(Category::Entertainment, 0.41))
        .unwrap();
    assert_eq!(
        db.last_shown_prediction("Gym membership").unwrap(),
        Some(Category::Entertainment)
    );

    db.record_shown_prediction("Gym membership", &prediction(Category::Healthcare, 0.52))
        .unwrap();
    assert_eq!(
        db.last_shown_prediction("Gym membership").unwrap(),
        Some(Category::Healthcare)
    );
}

#[test]
fn test_reopen_keeps_data() {
    let db = Database::in_memory().unwrap();
    db.insert_correction(&LabeledExample::correction("Lab work", Category::Healthcare), None)
        .unwrap();

    let reopened = Database::new(db.path()).unwrap();
    assert_eq!(reopened.count_corrections().unwrap(), 1);
}
