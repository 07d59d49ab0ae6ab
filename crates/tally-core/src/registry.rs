//! Process-wide holder of the active model
//!
//! Predictions clone an `Arc` to the current model under a brief read lock and
//! score outside it. Retrains are serialized by a separate mutex, build the new
//! model without touching the read path, and install it with one pointer swap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::info;

use crate::classifier::{Classifier, FittedModel};
use crate::corpus::{ArtifactStore, Corpus};
use crate::error::{Error, Result};
use crate::models::Prediction;

pub struct ModelRegistry {
    classifier: Classifier,
    active: RwLock<Option<Arc<FittedModel>>>,
    training: Mutex<()>,
    generation: AtomicU64,
}

impl ModelRegistry {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            classifier,
            active: RwLock::new(None),
            training: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Current model, if any
    pub fn snapshot(&self) -> Option<Arc<FittedModel>> {
        self.active
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_some()
    }

    /// Number of models installed so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Make `model` the active model
    pub fn install(&self, model: FittedModel) -> Arc<FittedModel> {
        let model = Arc::new(model);
        {
            let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
            *active = Some(Arc::clone(&model));
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "Installed model generation {} ({} examples, {} terms)",
            generation,
            model.metadata().example_count,
            model.vocabulary_len()
        );
        model
    }

    /// Predict with the active model
    pub fn predict(&self, raw: &str) -> Result<Prediction> {
        let model = self.snapshot().ok_or(Error::ModelNotLoaded)?;
        Ok(self.classifier.predict(&model, raw))
    }

    /// Train on `corpus` and install the result. Concurrent retrains run one
    /// at a time; predictions keep using the previous model until the swap.
    pub fn retrain(&self, corpus: &Corpus) -> Result<Arc<FittedModel>> {
        let _guard = self.training.lock().unwrap_or_else(PoisonError::into_inner);
        let model = self.classifier.train(corpus)?;
        Ok(self.install(model))
    }

    /// Persist the active model to `store`
    pub fn save_to(&self, store: &dyn ArtifactStore) -> Result<()> {
        let model = self.snapshot().ok_or(Error::ModelNotLoaded)?;
        store.save_artifact(&model)
    }
}
