//! Training corpus and the storage boundary
//!
//! The engine keeps two pieces of durable state: the corpus (seed examples
//! plus everything users corrected or imported) and the trained model
//! artifact. [`CorpusStore`] and [`ArtifactStore`] abstract where they live.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::classifier::FittedModel;
use crate::error::{Error, Result};
use crate::models::{Category, ExampleSource, LabeledExample, Prediction};
use crate::seed::seed_examples;

/// SHA-256 over the ordered (text, category) pairs
pub fn fingerprint(examples: &[LabeledExample]) -> String {
    let mut hasher = Sha256::new();
    for example in examples {
        hasher.update(example.category.as_str().as_bytes());
        hasher.update(b"\t");
        hasher.update(example.text.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Seed examples followed by accumulated (corrected or imported) examples
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    seed: Vec<LabeledExample>,
    corrected: Vec<LabeledExample>,
}

impl Corpus {
    pub fn new(seed: Vec<LabeledExample>, corrected: Vec<LabeledExample>) -> Self {
        Self { seed, corrected }
    }

    pub fn from_seed(seed: Vec<LabeledExample>) -> Self {
        Self::new(seed, Vec::new())
    }

    pub fn seed(&self) -> &[LabeledExample] {
        &self.seed
    }

    pub fn corrected(&self) -> &[LabeledExample] {
        &self.corrected
    }

    /// Append an accumulated example (the corpus only grows)
    pub fn push(&mut self, example: LabeledExample) {
        self.corrected.push(example);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LabeledExample> {
        self.seed.iter().chain(self.corrected.iter())
    }

    /// All examples in training order
    pub fn to_vec(&self) -> Vec<LabeledExample> {
        self.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.seed.len() + self.corrected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Categories with at least one example
    pub fn categories(&self) -> BTreeSet<Category> {
        self.iter().map(|e| e.category).collect()
    }

    /// Categories with no examples at all; the model can never predict these
    pub fn missing_categories(&self) -> Vec<Category> {
        let present = self.categories();
        Category::all()
            .iter()
            .copied()
            .filter(|c| !present.contains(c))
            .collect()
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.to_vec())
    }

    pub fn stats(&self) -> CorpusStats {
        let mut by_source: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_category: BTreeMap<Category, usize> = BTreeMap::new();
        for example in self.iter() {
            *by_source.entry(example.source.to_string()).or_default() += 1;
            *by_category.entry(example.category).or_default() += 1;
        }
        CorpusStats {
            total: self.len(),
            seed: self.seed.len(),
            accumulated: self.corrected.len(),
            by_source,
            by_category,
        }
    }
}

/// Example counts for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct CorpusStats {
    pub total: usize,
    pub seed: usize,
    /// Corrected plus imported examples
    pub accumulated: usize,
    pub by_source: BTreeMap<String, usize>,
    pub by_category: BTreeMap<Category, usize>,
}

/// Durable home of the corpus
pub trait CorpusStore: Send + Sync {
    fn load_corpus(&self) -> Result<Corpus>;

    /// Append a corrected or imported example. `shown` is the category the
    /// user saw, when known.
    fn append_corrected_example(
        &self,
        example: &LabeledExample,
        shown: Option<Category>,
    ) -> Result<()>;

    /// Remember the prediction shown for a description
    fn record_shown_prediction(&self, _description: &str, _prediction: &Prediction) -> Result<()> {
        Ok(())
    }

    /// Category most recently shown for a description
    fn last_shown_prediction(&self, _description: &str) -> Result<Option<Category>> {
        Ok(None)
    }
}

/// Durable home of the trained model
pub trait ArtifactStore: Send + Sync {
    fn load_artifact(&self) -> Result<FittedModel>;

    fn save_artifact(&self, model: &FittedModel) -> Result<()>;

    /// Human-readable location, for logs and status output
    fn location(&self) -> String;
}

/// In-process corpus store
#[derive(Debug, Default)]
pub struct MemoryCorpusStore {
    seed: Vec<LabeledExample>,
    corrected: Mutex<Vec<LabeledExample>>,
    shown: Mutex<HashMap<String, Category>>,
}

impl MemoryCorpusStore {
    pub fn new(seed: Vec<LabeledExample>) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Store seeded with the built-in examples
    pub fn with_builtin_seed() -> Self {
        Self::new(seed_examples())
    }
}

impl CorpusStore for MemoryCorpusStore {
    fn load_corpus(&self) -> Result<Corpus> {
        let corrected = self
            .corrected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(Corpus::new(self.seed.clone(), corrected))
    }

    fn append_corrected_example(
        &self,
        example: &LabeledExample,
        _shown: Option<Category>,
    ) -> Result<()> {
        self.corrected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(example.clone());
        Ok(())
    }

    fn record_shown_prediction(&self, description: &str, prediction: &Prediction) -> Result<()> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(description.to_string(), prediction.category);
        Ok(())
    }

    fn last_shown_prediction(&self, description: &str) -> Result<Option<Category>> {
        Ok(self
            .shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(description)
            .copied())
    }
}

/// In-process artifact store
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    model: Mutex<Option<FittedModel>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn load_artifact(&self) -> Result<FittedModel> {
        self.model
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| Error::ArtifactNotFound("in-memory store is empty".into()))
    }

    fn save_artifact(&self, model: &FittedModel) -> Result<()> {
        *self.model.lock().unwrap_or_else(PoisonError::into_inner) = Some(model.clone());
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// JSON artifact on the local filesystem
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    path: PathBuf,
}

impl FileArtifactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ArtifactStore for FileArtifactStore {
    fn load_artifact(&self) -> Result<FittedModel> {
        FittedModel::load(&self.path)
    }

    fn save_artifact(&self, model: &FittedModel) -> Result<()> {
        model.save(&self.path)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse a labeled CSV with `description` and `category` columns (any order,
/// header names case-insensitive). Rows with a blank description are skipped.
pub fn parse_labeled_csv<R: Read>(reader: R, source: ExampleSource) -> Result<Vec<LabeledExample>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::Import(format!("missing '{}' column", name)))
    };
    let text_col = column("description")?;
    let category_col = column("category")?;

    let mut examples = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1
        let line = i + 2;

        let text = record.get(text_col).unwrap_or("");
        if text.is_empty() {
            debug!("Skipping line {}: empty description", line);
            continue;
        }
        let raw_category = record.get(category_col).unwrap_or("");
        let category: Category = raw_category.parse().map_err(|_| {
            Error::Import(format!("line {}: unknown category '{}'", line, raw_category))
        })?;

        examples.push(LabeledExample::new(text, category, source));
    }

    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::seed::seed_corpus;
    use tempfile::TempDir;

    fn tiny_corpus() -> Corpus {
        Corpus::from_seed(vec![
            LabeledExample::seed("pizza dinner", Category::Food),
            LabeledExample::seed("bus ticket", Category::Transport),
        ])
    }

    #[test]
    fn test_missing_categories() {
        let corpus = tiny_corpus();
        assert_eq!(
            corpus.missing_categories(),
            vec![
                Category::Entertainment,
                Category::Shopping,
                Category::Bills,
                Category::Healthcare,
                Category::Other
            ]
        );
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let mut corpus = tiny_corpus();
        let before = corpus.fingerprint();
        assert_eq!(before, tiny_corpus().fingerprint());
        assert_eq!(before.len(), 64);

        corpus.push(LabeledExample::correction("gym", Category::Healthcare));
        assert_ne!(before, corpus.fingerprint());
    }

    #[test]
    fn test_fingerprint_ignores_source() {
        let a = vec![LabeledExample::seed("gym", Category::Healthcare)];
        let b = vec![LabeledExample::correction("gym", Category::Healthcare)];
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_corpus_order_and_stats() {
        let mut corpus = tiny_corpus();
        corpus.push(LabeledExample::correction("gym", Category::Healthcare));
        corpus.push(LabeledExample::new("taxi", Category::Transport, ExampleSource::Import));

        let texts: Vec<&str> = corpus.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["pizza dinner", "bus ticket", "gym", "taxi"]);

        let stats = corpus.stats();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.seed, 2);
        assert_eq!(stats.accumulated, 2);
        assert_eq!(stats.by_source["import"], 1);
        assert_eq!(stats.by_category[&Category::Transport], 2);
    }

    #[test]
    fn test_memory_corpus_store() {
        let store = MemoryCorpusStore::with_builtin_seed();
        let initial = store.load_corpus().unwrap();
        assert_eq!(initial.len(), seed_corpus().len());

        store
            .append_corrected_example(
                &LabeledExample::correction("Gym membership", Category::Healthcare),
                Some(Category::Entertainment),
            )
            .unwrap();
        let corpus = store.load_corpus().unwrap();
        assert_eq!(corpus.corrected().len(), 1);
        assert_eq!(corpus.len(), initial.len() + 1);
    }

    #[test]
    fn test_memory_store_remembers_shown() {
        let store = MemoryCorpusStore::default();
        assert_eq!(store.last_shown_prediction("coffee").unwrap(), None);

        let prediction = crate::classifier::ConfidencePolicy::default().apply(vec![
            crate::models::CategoryScore {
                category: Category::Food,
                probability: 0.9,
            },
        ]);
        store.record_shown_prediction("coffee", &prediction).unwrap();
        assert_eq!(
            store.last_shown_prediction("coffee").unwrap(),
            Some(Category::Food)
        );
    }

    #[test]
    fn test_artifact_stores() {
        let model = Classifier::default().train(&tiny_corpus()).unwrap();

        let memory = MemoryArtifactStore::new();
        assert!(matches!(
            memory.load_artifact(),
            Err(Error::ArtifactNotFound(_))
        ));
        memory.save_artifact(&model).unwrap();
        assert_eq!(memory.load_artifact().unwrap().metadata(), model.metadata());

        let dir = TempDir::new().unwrap();
        let file = FileArtifactStore::new(dir.path().join("model.json"));
        assert!(matches!(file.load_artifact(), Err(Error::ArtifactNotFound(_))));
        file.save_artifact(&model).unwrap();
        assert_eq!(file.load_artifact().unwrap().metadata(), model.metadata());
        assert!(file.location().ends_with("model.json"));
    }

    #[test]
    fn test_parse_labeled_csv() {
        let data = "Category,Description\nFood, Pho noodles \nTransportation,Ferry ticket\nbills,\n";
        let examples = parse_labeled_csv(data.as_bytes(), ExampleSource::Import).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0].text, "Pho noodles");
        assert_eq!(examples[0].category, Category::Food);
        assert_eq!(examples[1].category, Category::Transport);
        assert_eq!(examples[1].source, ExampleSource::Import);
    }

    #[test]
    fn test_parse_labeled_csv_errors() {
        let missing = "text,category\nfoo,Food\n";
        assert!(matches!(
            parse_labeled_csv(missing.as_bytes(), ExampleSource::Import),
            Err(Error::Import(_))
        ));

        let unknown = "description,category\nfoo,Groceries\n";
        let err = parse_labeled_csv(unknown.as_bytes(), ExampleSource::Import).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
