//! Corrected examples and shown predictions

use rusqlite::{params, OptionalExtension};
use tracing::warn;

use super::{parse_datetime, Database};
use crate::corpus::{Corpus, CorpusStore};
use crate::error::Result;
use crate::models::{Category, ExampleSource, LabeledExample, Prediction, StoredCorrection};
use crate::seed::seed_examples;

impl Database {
    /// Append a corrected or imported example
    pub fn insert_correction(
        &self,
        example: &LabeledExample,
        shown: Option<Category>,
    ) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO corrected_examples (description, category, source, shown_category)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                example.text,
                example.category.as_str(),
                example.source.as_str(),
                shown.map(|c| c.as_str()),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Stored examples in insertion order, optionally only the most recent `limit`
    pub fn list_corrections(&self, limit: Option<i64>) -> Result<Vec<StoredCorrection>> {
        let conn = self.conn()?;

        // Newest `limit` rows, returned oldest first
        let mut stmt = conn.prepare(
            r#"
            SELECT id, description, category, source, shown_category, created_at
            FROM (
                SELECT * FROM corrected_examples
                ORDER BY id DESC
                LIMIT ?
            )
            ORDER BY id ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![limit.unwrap_or(-1)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Rows with an unknown category are skipped so they never become training data
        let corrections = rows
            .into_iter()
            .filter_map(|(id, text, category_str, source_str, shown_str, created_at_str)| {
                let category = match category_str.parse::<Category>() {
                    Ok(category) => category,
                    Err(e) => {
                        warn!("Skipping stored correction {}: {}", id, e);
                        return None;
                    }
                };
                Some(StoredCorrection {
                    id,
                    example: LabeledExample::new(
                        text,
                        category,
                        source_str.parse().unwrap_or(ExampleSource::Correction),
                    ),
                    shown: shown_str.and_then(|s| s.parse().ok()),
                    created_at: parse_datetime(&created_at_str),
                })
            })
            .collect();

        Ok(corrections)
    }

    pub fn count_corrections(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM corrected_examples", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }

    /// Remember the prediction shown for a description (replaces any earlier one)
    pub fn upsert_shown_prediction(&self, description: &str, prediction: &Prediction) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO shown_predictions (description, category, raw_category, confidence)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(description) DO UPDATE SET
                category = excluded.category,
                raw_category = excluded.raw_category,
                confidence = excluded.confidence,
                shown_at = CURRENT_TIMESTAMP
            "#,
            params![
                description,
                prediction.category.as_str(),
                prediction.raw_category.as_str(),
                prediction.confidence,
            ],
        )?;

        Ok(())
    }

    pub fn get_shown_prediction(&self, description: &str) -> Result<Option<Category>> {
        let conn = self.conn()?;

        let category: Option<String> = conn
            .query_row(
                "SELECT category FROM shown_predictions WHERE description = ?",
                params![description],
                |row| row.get(0),
            )
            .optional()?;

        Ok(category.and_then(|s| s.parse().ok()))
    }
}

impl CorpusStore for Database {
    fn load_corpus(&self) -> Result<Corpus> {
        let corrected = self
            .list_corrections(None)?
            .into_iter()
            .map(|c| c.example)
            .collect();
        Ok(Corpus::new(seed_examples(), corrected))
    }

    fn append_corrected_example(
        &self,
        example: &LabeledExample,
        shown: Option<Category>,
    ) -> Result<()> {
        self.insert_correction(example, shown)?;
        Ok(())
    }

    fn record_shown_prediction(&self, description: &str, prediction: &Prediction) -> Result<()> {
        self.upsert_shown_prediction(description, prediction)
    }

    fn last_shown_prediction(&self, description: &str) -> Result<Option<Category>> {
        self.get_shown_prediction(description)
    }
}
