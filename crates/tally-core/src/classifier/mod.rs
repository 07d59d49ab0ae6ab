//! Expense classifier: training, prediction, and model artifacts
//!
//! A [`Classifier`] holds the pipeline settings (normalizer, vectorizer and
//! training hyperparameters, confidence policy). Training produces an immutable
//! [`FittedModel`] that can be shared between threads and persisted as a JSON
//! artifact.

mod softmax;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::corpus::{fingerprint, Corpus};
use crate::error::{Error, Result};
use crate::features::{SparseVector, TfidfVectorizer, VectorizerConfig};
use crate::models::{Category, CategoryScore, LabeledExample, Prediction};
use crate::normalize::Normalizer;

/// Bumped whenever the artifact layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// How training examples are weighted per class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    /// Weight each class inversely to its frequency
    Balanced,
    None,
}

impl ClassWeight {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::None => "none",
        }
    }
}

impl std::str::FromStr for ClassWeight {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "balanced" => Ok(Self::Balanced),
            "none" => Ok(Self::None),
            _ => Err(format!("Unknown class weight: {}", s)),
        }
    }
}

/// Optimizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Inverse L2 regularization strength
    pub c: f64,
    pub max_iter: usize,
    /// Stop once every gradient component is below this
    pub tolerance: f64,
    pub class_weight: ClassWeight,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tolerance: 1e-5,
            class_weight: ClassWeight::Balanced,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "training.c must be a positive number, got {}",
                self.c
            )));
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidConfig(
                "training.max_iter must be at least 1".into(),
            ));
        }
        if !(self.tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "training.tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Low-confidence fallback rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePolicy {
    /// Minimum top probability for the argmax label to be shown
    pub threshold: f64,
    /// Category shown when confidence is below the threshold
    pub fallback: Category,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            threshold: 0.30,
            fallback: Category::Other,
        }
    }
}

impl ConfidencePolicy {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InvalidConfig(format!(
                "classifier.confidence_threshold must be in [0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Turn a probability distribution into a prediction.
    ///
    /// The top category is the first one holding the maximum probability, so
    /// ties go to the earlier class. Confidence is always the top probability,
    /// even when the fallback is shown.
    pub fn apply(&self, probabilities: Vec<CategoryScore>) -> Prediction {
        let top = probabilities.iter().fold(None, |best: Option<CategoryScore>, s| {
            match best {
                Some(b) if b.probability >= s.probability => Some(b),
                _ => Some(*s),
            }
        });

        let Some(top) = top else {
            return Prediction {
                category: self.fallback,
                confidence: 0.0,
                raw_category: self.fallback,
                fallback: true,
                probabilities,
            };
        };

        let fallback = top.probability < self.threshold;
        Prediction {
            category: if fallback { self.fallback } else { top.category },
            confidence: top.probability,
            raw_category: top.category,
            fallback,
            probabilities,
        }
    }
}

/// Provenance recorded with every trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub example_count: usize,
    /// SHA-256 over the training examples
    pub corpus_fingerprint: String,
    /// Version of the rewrite table used to normalize the training text
    pub rules_version: u32,
    pub iterations: usize,
    pub converged: bool,
}

/// Immutable trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedModel {
    metadata: ModelMetadata,
    vectorizer: TfidfVectorizer,
    classes: Vec<Category>,
    /// One row per class, one column per vocabulary term
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

impl FittedModel {
    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Categories the model can predict, in enumeration order
    pub fn classes(&self) -> &[Category] {
        &self.classes
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vectorizer.len()
    }

    /// Class probabilities for already-normalized text
    pub fn probabilities(&self, normalized: &str) -> Vec<CategoryScore> {
        let x = self.vectorizer.transform(normalized);
        let mut z: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| b + dot(row, &x))
            .collect();
        softmax::softmax_in_place(&mut z);

        self.classes
            .iter()
            .zip(z)
            .map(|(&category, probability)| CategoryScore {
                category,
                probability,
            })
            .collect()
    }

    /// Write the model to `path` atomically (temp file + rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(&mut temp);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        debug!("Saved model artifact to {}", path.display());
        Ok(())
    }

    /// Read a model saved by [`FittedModel::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| Error::ArtifactNotFound(format!("{}: {}", path.display(), e)))?;

        let model: FittedModel = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::ArtifactCorrupt(format!("{}: {}", path.display(), e)))?;
        model
            .validate()
            .map_err(|reason| Error::ArtifactCorrupt(format!("{}: {}", path.display(), reason)))?;

        debug!(
            "Loaded model artifact from {} ({} examples, trained {})",
            path.display(),
            model.metadata.example_count,
            model.metadata.trained_at
        );
        Ok(model)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.metadata.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(format!(
                "format version {} (expected {})",
                self.metadata.format_version, ARTIFACT_FORMAT_VERSION
            ));
        }
        if self.classes.len() < 2 {
            return Err(format!("{} classes", self.classes.len()));
        }
        if self.weights.len() != self.classes.len() || self.intercepts.len() != self.classes.len() {
            return Err("parameter shape does not match class count".into());
        }
        if !self.vectorizer.is_consistent()
            || self.weights.iter().any(|row| row.len() != self.vectorizer.len())
        {
            return Err("parameter shape does not match vocabulary".into());
        }
        Ok(())
    }
}

fn dot(row: &[f64], x: &SparseVector) -> f64 {
    x.iter().map(|&(j, v)| row[j] * v).sum()
}

/// Training and prediction pipeline
#[derive(Debug, Clone)]
pub struct Classifier {
    normalizer: Normalizer,
    features: VectorizerConfig,
    training: TrainingConfig,
    policy: ConfidencePolicy,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            Normalizer::default(),
            VectorizerConfig::default(),
            TrainingConfig::default(),
            ConfidencePolicy::default(),
        )
    }
}

impl Classifier {
    pub fn new(
        normalizer: Normalizer,
        features: VectorizerConfig,
        training: TrainingConfig,
        policy: ConfidencePolicy,
    ) -> Self {
        Self {
            normalizer,
            features,
            training,
            policy,
        }
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn policy(&self) -> &ConfidencePolicy {
        &self.policy
    }

    pub fn rules_version(&self) -> u32 {
        self.normalizer.table().version()
    }

    /// Train on a corpus (seed plus corrections)
    pub fn train(&self, corpus: &Corpus) -> Result<FittedModel> {
        let missing = corpus.missing_categories();
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|c| c.as_str()).collect();
            warn!(
                "Corpus has no examples for {}; these categories cannot be predicted",
                names.join(", ")
            );
        }
        self.train_examples(&corpus.to_vec())
    }

    /// Train on an explicit list of examples
    pub fn train_examples(&self, examples: &[LabeledExample]) -> Result<FittedModel> {
        if examples.is_empty() {
            return Err(Error::InsufficientData("corpus is empty".into()));
        }

        let classes: Vec<Category> = Category::all()
            .iter()
            .copied()
            .filter(|c| examples.iter().any(|e| e.category == *c))
            .collect();
        if classes.len() < 2 {
            return Err(Error::InsufficientData(format!(
                "corpus covers {} category; at least 2 are required",
                classes.len()
            )));
        }
        let class_index: HashMap<Category, usize> =
            classes.iter().enumerate().map(|(i, &c)| (c, i)).collect();

        let documents: Vec<String> = examples
            .iter()
            .map(|e| self.normalizer.normalize(&e.text))
            .collect();
        let vectorizer = TfidfVectorizer::fit(&self.features, &documents)?;
        let rows: Vec<SparseVector> = documents.iter().map(|d| vectorizer.transform(d)).collect();
        let labels: Vec<usize> = examples.iter().map(|e| class_index[&e.category]).collect();

        let n_features = vectorizer.len();
        let fit = softmax::fit(&rows, &labels, classes.len(), n_features, &self.training);
        if fit.converged {
            info!(
                "Trained model on {} examples ({} classes, {} terms) in {} iterations",
                examples.len(),
                classes.len(),
                n_features,
                fit.iterations
            );
        } else {
            warn!(
                "Training stopped after {} iterations without converging; using last estimate",
                fit.iterations
            );
        }

        let weights = fit
            .weights
            .chunks(n_features)
            .map(|row| row.to_vec())
            .collect();

        Ok(FittedModel {
            metadata: ModelMetadata {
                format_version: ARTIFACT_FORMAT_VERSION,
                trained_at: Utc::now(),
                example_count: examples.len(),
                corpus_fingerprint: fingerprint(examples),
                rules_version: self.rules_version(),
                iterations: fit.iterations,
                converged: fit.converged,
            },
            vectorizer,
            classes,
            weights,
            intercepts: fit.intercepts,
        })
    }

    /// Predict the category of a raw description
    pub fn predict(&self, model: &FittedModel, raw: &str) -> Prediction {
        let normalized = self.normalizer.normalize(raw);
        let prediction = self.policy.apply(model.probabilities(&normalized));
        if prediction.fallback {
            debug!(
                "Low confidence for '{}' ({} at {:.2}); showing {}",
                raw, prediction.raw_category, prediction.confidence, prediction.category
            );
        }
        prediction
    }
}
