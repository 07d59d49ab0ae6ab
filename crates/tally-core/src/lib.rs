//! Tally Core Library
//!
//! Expense categorization engine:
//! - Text normalizer with a versioned brand/vendor rewrite table
//! - TF-IDF features and a multinomial logistic regression classifier
//! - Confidence fallback for low-certainty predictions
//! - Retrain-on-correction feedback loop
//! - Pluggable storage for the corpus and model artifact (memory, file, SQLite)

pub mod categorizer;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod evaluate;
pub mod features;
pub mod models;
pub mod normalize;
pub mod registry;
pub mod seed;

pub use categorizer::{Categorizer, CategorizerStatus};
pub use classifier::{
    ClassWeight, Classifier, ConfidencePolicy, FittedModel, ModelMetadata, TrainingConfig,
};
pub use config::Config;
pub use corpus::{
    ArtifactStore, Corpus, CorpusStats, CorpusStore, FileArtifactStore, MemoryArtifactStore,
    MemoryCorpusStore,
};
pub use db::Database;
pub use error::{Error, Result};
pub use evaluate::{benchmark_examples, evaluate, stratified_split, EvaluationReport};
pub use features::{TfidfVectorizer, VectorizerConfig};
pub use models::{
    Category, CategoryScore, ExampleSource, FeedbackOutcome, LabeledExample, Prediction,
};
pub use normalize::{normalize, Normalizer, RewriteRule, RewriteTable};
pub use registry::ModelRegistry;
