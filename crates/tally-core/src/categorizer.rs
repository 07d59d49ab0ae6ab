//! Categorization service: predictions plus retrain-on-correction
//!
//! [`Categorizer`] is the engine's outer API. It owns a [`ModelRegistry`] and
//! the two storage ports. The model is created lazily on the first call: a
//! stored artifact is used when it matches the current corpus and rewrite
//! table, otherwise the model is retrained from the corpus and saved.
//!
//! A correction is feedback whose confirmed category differs from the one the
//! user was shown. Corrections are appended to the corpus and, once
//! `retrain_batch_size` of them are pending (1 by default), the model is
//! retrained before the call returns.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classifier::{Classifier, FittedModel, ModelMetadata};
use crate::config::Config;
use crate::corpus::{ArtifactStore, Corpus, CorpusStats, CorpusStore};
use crate::error::Result;
use crate::models::{Category, FeedbackOutcome, LabeledExample, Prediction};
use crate::registry::ModelRegistry;

/// Snapshot of the engine for status output
#[derive(Debug, Clone, Serialize)]
pub struct CategorizerStatus {
    pub model_loaded: bool,
    pub generation: u64,
    pub model: Option<ModelMetadata>,
    pub classes: Vec<Category>,
    pub vocabulary_size: usize,
    /// True when the active model was trained on a different corpus or table
    pub stale: bool,
    pub corpus: CorpusStats,
    pub pending_corrections: usize,
    pub retrain_batch_size: usize,
    pub artifact_location: String,
}

pub struct Categorizer {
    registry: ModelRegistry,
    corpus_store: Arc<dyn CorpusStore>,
    artifact_store: Arc<dyn ArtifactStore>,
    retrain_batch_size: usize,
    /// Guards lazy initialization so concurrent cold starts train once
    init: Mutex<()>,
    /// Serializes append-correction-then-retrain; holds the pending count
    feedback: Mutex<usize>,
}

impl Categorizer {
    pub fn new(
        classifier: Classifier,
        corpus_store: Arc<dyn CorpusStore>,
        artifact_store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            registry: ModelRegistry::new(classifier),
            corpus_store,
            artifact_store,
            retrain_batch_size: 1,
            init: Mutex::new(()),
            feedback: Mutex::new(0),
        }
    }

    /// Build from configuration (classifier settings and batch size)
    pub fn from_config(
        config: &Config,
        corpus_store: Arc<dyn CorpusStore>,
        artifact_store: Arc<dyn ArtifactStore>,
    ) -> Result<Self> {
        Ok(Self::new(config.classifier()?, corpus_store, artifact_store)
            .with_retrain_batch_size(config.retrain_batch_size))
    }

    pub fn with_retrain_batch_size(mut self, size: usize) -> Self {
        self.retrain_batch_size = size.max(1);
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn classifier(&self) -> &Classifier {
        self.registry.classifier()
    }

    /// Current corpus from the store
    pub fn corpus(&self) -> Result<Corpus> {
        self.corpus_store.load_corpus()
    }

    /// Active model, loading or training it on first use
    pub fn ensure_model(&self) -> Result<Arc<FittedModel>> {
        if let Some(model) = self.registry.snapshot() {
            return Ok(model);
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = self.registry.snapshot() {
            return Ok(model);
        }

        // Corrections wait until the cold-start model is installed, then retrain on top of it
        let mut pending = self.feedback.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = self.registry.snapshot() {
            return Ok(model);
        }

        let corpus = self.corpus_store.load_corpus()?;
        match self.artifact_store.load_artifact() {
            Ok(model) if self.is_current(&model, &corpus) => {
                info!("Loaded model from {}", self.artifact_store.location());
                return Ok(self.registry.install(model));
            }
            Ok(_) => info!("Stored model is out of date with the corpus; retraining"),
            Err(e) if e.is_recoverable_load_failure() => {
                info!("No usable stored model ({}); training from corpus", e)
            }
            Err(e) => warn!("Failed to load stored model ({}); training from corpus", e),
        }

        let model = self.train_and_save(&corpus)?;
        *pending = 0;
        Ok(model)
    }

    /// Whether `model` was trained on exactly this corpus and rewrite table
    fn is_current(&self, model: &FittedModel, corpus: &Corpus) -> bool {
        let metadata = model.metadata();
        metadata.corpus_fingerprint == corpus.fingerprint()
            && metadata.rules_version == self.classifier().rules_version()
    }

    fn train_and_save(&self, corpus: &Corpus) -> Result<Arc<FittedModel>> {
        let model = self.registry.retrain(corpus)?;
        // The in-memory model stays authoritative if persisting fails
        if let Err(e) = self.registry.save_to(self.artifact_store.as_ref()) {
            warn!(
                "Failed to save model to {}: {}",
                self.artifact_store.location(),
                e
            );
        }
        Ok(model)
    }

    /// Predict the category for a description and remember what was shown
    pub fn categorize(&self, description: &str) -> Result<Prediction> {
        let model = self.ensure_model()?;
        let prediction = self.classifier().predict(&model, description);
        self.corpus_store
            .record_shown_prediction(description, &prediction)?;
        Ok(prediction)
    }

    /// Record the category a user confirmed for a description.
    ///
    /// The baseline is the prediction last shown for this description; if
    /// none was stored, the current model's prediction is used.
    pub fn record_feedback(&self, description: &str, confirmed: &str) -> Result<FeedbackOutcome> {
        let confirmed = Category::parse(confirmed)?;
        let shown = match self.corpus_store.last_shown_prediction(description)? {
            Some(category) => category,
            None => {
                debug!("No stored prediction for '{}'; predicting now", description);
                let model = self.ensure_model()?;
                self.classifier().predict(&model, description).category
            }
        };
        self.record_feedback_with_shown(description, confirmed, shown)
    }

    /// Record feedback against an explicitly supplied shown category
    pub fn record_feedback_with_shown(
        &self,
        description: &str,
        confirmed: Category,
        shown: Category,
    ) -> Result<FeedbackOutcome> {
        if confirmed == shown {
            debug!("Confirmed '{}' as {}", description, confirmed);
            return Ok(FeedbackOutcome {
                confirmed,
                shown,
                correction: false,
                retrained: false,
            });
        }

        let mut pending = self.feedback.lock().unwrap_or_else(PoisonError::into_inner);
        self.corpus_store.append_corrected_example(
            &LabeledExample::correction(description, confirmed),
            Some(shown),
        )?;
        *pending += 1;
        info!("Correction: '{}' {} -> {}", description, shown, confirmed);

        let retrained = if *pending >= self.retrain_batch_size {
            // The correction is stored; a failed retrain leaves it pending for the next one
            match self
                .corpus_store
                .load_corpus()
                .and_then(|corpus| self.train_and_save(&corpus))
            {
                Ok(_) => {
                    *pending = 0;
                    true
                }
                Err(e) => {
                    warn!(
                        "Correction stored but retrain failed ({}); {} correction(s) pending",
                        e, *pending
                    );
                    false
                }
            }
        } else {
            debug!(
                "{} of {} corrections pending before retrain",
                *pending, self.retrain_batch_size
            );
            false
        };

        Ok(FeedbackOutcome {
            confirmed,
            shown,
            correction: true,
            retrained,
        })
    }

    /// Append already-labeled examples (e.g. a CSV import) and retrain
    pub fn import_examples(&self, examples: &[LabeledExample]) -> Result<usize> {
        let mut pending = self.feedback.lock().unwrap_or_else(PoisonError::into_inner);
        for example in examples {
            self.corpus_store.append_corrected_example(example, None)?;
        }
        if !examples.is_empty() {
            let corpus = self.corpus_store.load_corpus()?;
            self.train_and_save(&corpus)?;
            *pending = 0;
        }
        info!("Imported {} examples", examples.len());
        Ok(examples.len())
    }

    /// Retrain from the full corpus now, clearing pending corrections
    pub fn retrain(&self) -> Result<Arc<FittedModel>> {
        let mut pending = self.feedback.lock().unwrap_or_else(PoisonError::into_inner);
        let corpus = self.corpus_store.load_corpus()?;
        let model = self.train_and_save(&corpus)?;
        *pending = 0;
        Ok(model)
    }

    pub fn pending_corrections(&self) -> usize {
        *self.feedback.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Describe the engine without loading or training a model
    pub fn status(&self) -> Result<CategorizerStatus> {
        let corpus = self.corpus_store.load_corpus()?;
        let model = self.registry.snapshot().or_else(|| {
            self.artifact_store
                .load_artifact()
                .ok()
                .map(Arc::new)
        });

        let stale = model
            .as_ref()
            .map(|m| !self.is_current(m, &corpus))
            .unwrap_or(false);

        Ok(CategorizerStatus {
            model_loaded: self.registry.is_loaded(),
            generation: self.registry.generation(),
            model: model.as_ref().map(|m| m.metadata().clone()),
            classes: model
                .as_ref()
                .map(|m| m.classes().to_vec())
                .unwrap_or_default(),
            vocabulary_size: model.as_ref().map(|m| m.vocabulary_len()).unwrap_or(0),
            stale,
            corpus: corpus.stats(),
            pending_corrections: self.pending_corrections(),
            retrain_batch_size: self.retrain_batch_size,
            artifact_location: self.artifact_store.location(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{MemoryArtifactStore, MemoryCorpusStore};
    use crate::error::Error;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;
    use std::time::Duration;

    /// Corpus store whose first load stalls, widening the cold-start window
    struct SlowCorpusStore {
        inner: MemoryCorpusStore,
        stalled: AtomicBool,
    }

    impl CorpusStore for SlowCorpusStore {
        fn load_corpus(&self) -> Result<Corpus> {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(300));
            }
            self.inner.load_corpus()
        }

        fn append_corrected_example(
            &self,
            example: &LabeledExample,
            shown: Option<Category>,
        ) -> Result<()> {
            self.inner.append_corrected_example(example, shown)
        }
    }

    fn setup() -> (Categorizer, Arc<MemoryCorpusStore>, Arc<MemoryArtifactStore>) {
        let corpus = Arc::new(MemoryCorpusStore::with_builtin_seed());
        let artifacts = Arc::new(MemoryArtifactStore::new());
        let categorizer = Categorizer::new(
            Classifier::default(),
            corpus.clone(),
            artifacts.clone(),
        );
        (categorizer, corpus, artifacts)
    }

    #[test]
    fn test_lazy_train_and_save() {
        let (categorizer, _, artifacts) = setup();
        assert!(!categorizer.registry().is_loaded());
        assert!(artifacts.load_artifact().is_err());

        let prediction = categorizer.categorize("Doctor appointment").unwrap();
        assert_eq!(prediction.category, Category::Healthcare);
        assert!(prediction.confidence >= 0.3);

        assert!(categorizer.registry().is_loaded());
        assert!(artifacts.load_artifact().is_ok());
        assert_eq!(categorizer.registry().generation(), 1);
    }

    #[test]
    fn test_reuses_current_artifact() {
        let (first, corpus, artifacts) = setup();
        first.categorize("Pharmacy").unwrap();

        let second = Categorizer::new(Classifier::default(), corpus, artifacts.clone());
        second.categorize("Pharmacy").unwrap();
        // Loaded, not retrained: same training timestamp
        assert_eq!(
            second.registry().snapshot().unwrap().metadata().trained_at,
            artifacts.load_artifact().unwrap().metadata().trained_at
        );
        assert_eq!(second.registry().generation(), 1);
    }

    #[test]
    fn test_stale_artifact_triggers_retrain() {
        let (first, corpus, artifacts) = setup();
        first.categorize("Pharmacy").unwrap();
        let old = artifacts.load_artifact().unwrap();

        corpus
            .append_corrected_example(
                &LabeledExample::correction("Gym membership", Category::Healthcare),
                None,
            )
            .unwrap();

        let second = Categorizer::new(Classifier::default(), corpus, artifacts.clone());
        second.categorize("Pharmacy").unwrap();
        let model = second.registry().snapshot().unwrap();
        assert_ne!(
            model.metadata().corpus_fingerprint,
            old.metadata().corpus_fingerprint
        );
        assert_eq!(model.metadata().example_count, old.metadata().example_count + 1);
    }

    #[test]
    fn test_confirmation_is_not_a_correction() {
        let (categorizer, corpus, _) = setup();
        let shown = categorizer.categorize("Electric bill payment").unwrap();
        assert_eq!(shown.category, Category::Bills);

        let outcome = categorizer
            .record_feedback("Electric bill payment", "bills")
            .unwrap();
        assert!(!outcome.correction);
        assert!(!outcome.retrained);
        assert!(corpus.load_corpus().unwrap().corrected().is_empty());
        assert_eq!(categorizer.registry().generation(), 1);
    }

    #[test]
    fn test_correction_shifts_probability() {
        let (categorizer, _, _) = setup();
        let before = categorizer.categorize("Gym membership").unwrap();
        assert_ne!(before.category, Category::Healthcare);

        let outcome = categorizer
            .record_feedback("Gym membership", "Healthcare")
            .unwrap();
        assert!(outcome.correction);
        assert!(outcome.retrained);
        assert_eq!(outcome.shown, before.category);

        let after = categorizer.categorize("Gym membership").unwrap();
        assert!(
            after.probability_of(Category::Healthcare) > before.probability_of(Category::Healthcare)
        );
    }

    #[test]
    fn test_repeated_corrections_flip_prediction() {
        let (categorizer, _, _) = setup();
        let mut flipped = false;
        for _ in 0..5 {
            categorizer.categorize("Gym membership").unwrap();
            categorizer
                .record_feedback("Gym membership", "Healthcare")
                .unwrap();
            if categorizer.categorize("Gym membership").unwrap().category == Category::Healthcare {
                flipped = true;
                break;
            }
        }
        assert!(flipped);
    }

    #[test]
    fn test_fallback_shown_counts_as_correction() {
        let (categorizer, corpus, _) = setup();
        let shown = categorizer.categorize("Clothes at Target").unwrap();
        assert_eq!(shown.category, Category::Other);
        assert_eq!(shown.raw_category, Category::Shopping);

        // User confirms the raw argmax, which differs from what was shown
        let outcome = categorizer
            .record_feedback("Clothes at Target", "Shopping")
            .unwrap();
        assert!(outcome.correction);
        assert_eq!(corpus.load_corpus().unwrap().corrected().len(), 1);
    }

    #[test]
    fn test_feedback_without_shown_prediction() {
        let (categorizer, _, _) = setup();
        let outcome = categorizer
            .record_feedback("Hospital visit", "Healthcare")
            .unwrap();
        assert_eq!(outcome.shown, Category::Healthcare);
        assert!(!outcome.correction);
    }

    #[test]
    fn test_feedback_unknown_category() {
        let (categorizer, _, _) = setup();
        assert!(matches!(
            categorizer.record_feedback("Gym", "Fitness"),
            Err(Error::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_batched_retrain() {
        let (categorizer, _, _) = setup();
        let categorizer = categorizer.with_retrain_batch_size(2);
        categorizer.categorize("warmup").unwrap();

        let first = categorizer
            .record_feedback_with_shown("Gym membership", Category::Healthcare, Category::Entertainment)
            .unwrap();
        assert!(!first.retrained);
        assert_eq!(categorizer.pending_corrections(), 1);

        let second = categorizer
            .record_feedback_with_shown("Yoga class", Category::Healthcare, Category::Entertainment)
            .unwrap();
        assert!(second.retrained);
        assert_eq!(categorizer.pending_corrections(), 0);
        assert_eq!(categorizer.registry().generation(), 2);
    }

    #[test]
    fn test_import_examples_retrains() {
        let (categorizer, corpus, _) = setup();
        let examples = vec![
            LabeledExample::new("Ferry ticket", Category::Transport, crate::models::ExampleSource::Import),
            LabeledExample::new("Vet visit", Category::Other, crate::models::ExampleSource::Import),
        ];
        assert_eq!(categorizer.import_examples(&examples).unwrap(), 2);
        assert_eq!(corpus.load_corpus().unwrap().corrected().len(), 2);
        assert_eq!(categorizer.registry().generation(), 1);
    }

    #[test]
    fn test_status() {
        let (categorizer, _, _) = setup();
        let status = categorizer.status().unwrap();
        assert!(!status.model_loaded);
        assert!(status.model.is_none());
        assert_eq!(status.corpus.total, 244);

        categorizer.categorize("Netflix").unwrap();
        let status = categorizer.status().unwrap();
        assert!(status.model_loaded);
        assert!(!status.stale);
        assert_eq!(status.classes.len(), 7);
        assert_eq!(status.artifact_location, "memory");
    }

    #[test]
    fn test_concurrent_cold_start_trains_once() {
        let (categorizer, _, _) = setup();
        let categorizer = Arc::new(categorizer);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let categorizer = Arc::clone(&categorizer);
                thread::spawn(move || categorizer.categorize("Uber ride to airport").unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().raw_category, Category::Transport);
        }
        assert_eq!(categorizer.registry().generation(), 1);
    }

    #[test]
    fn test_correction_during_cold_start_is_kept() {
        let corpus = Arc::new(SlowCorpusStore {
            inner: MemoryCorpusStore::with_builtin_seed(),
            stalled: AtomicBool::new(false),
        });
        let categorizer = Arc::new(Categorizer::new(
            Classifier::default(),
            corpus.clone(),
            Arc::new(MemoryArtifactStore::new()),
        ));

        let cold_start = {
            let categorizer = Arc::clone(&categorizer);
            thread::spawn(move || categorizer.categorize("Gym membership").unwrap())
        };
        thread::sleep(Duration::from_millis(50));

        let outcome = categorizer
            .record_feedback_with_shown("Gym membership", Category::Healthcare, Category::Entertainment)
            .unwrap();
        assert!(outcome.retrained);
        cold_start.join().unwrap();

        let model = categorizer.registry().snapshot().unwrap();
        let current = corpus.load_corpus().unwrap();
        assert_eq!(model.metadata().example_count, 245);
        assert_eq!(model.metadata().corpus_fingerprint, current.fingerprint());
        assert_eq!(categorizer.registry().generation(), 2);
        assert_eq!(categorizer.pending_corrections(), 0);
    }

    #[test]
    fn test_failed_retrain_keeps_correction_pending() {
        let seed = vec![
            LabeledExample::seed("pizza delivery", Category::Food),
            LabeledExample::seed("sushi dinner", Category::Food),
        ];
        let corpus = Arc::new(MemoryCorpusStore::new(seed));
        let categorizer = Categorizer::new(
            Classifier::default(),
            corpus.clone(),
            Arc::new(MemoryArtifactStore::new()),
        );

        // Single-category corpus: the correction is stored but cannot be trained on yet
        let outcome = categorizer
            .record_feedback_with_shown("Bagel breakfast", Category::Food, Category::Other)
            .unwrap();
        assert!(outcome.correction);
        assert!(!outcome.retrained);
        assert_eq!(corpus.load_corpus().unwrap().corrected().len(), 1);
        assert_eq!(categorizer.pending_corrections(), 1);
        assert!(!categorizer.registry().is_loaded());

        let outcome = categorizer
            .record_feedback_with_shown("Bus pass", Category::Transport, Category::Food)
            .unwrap();
        assert!(outcome.retrained);
        assert_eq!(categorizer.pending_corrections(), 0);
        assert_eq!(corpus.load_corpus().unwrap().corrected().len(), 2);
    }
}
