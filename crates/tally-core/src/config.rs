//! Engine configuration
//!
//! Settings come from a TOML file with `[classifier]`, `[features]`,
//! `[training]`, `[feedback]` and `[rules]` sections. The default file is
//! compiled into the binary; a user copy at
//! `~/.local/share/tally/config/tally.toml` (or an explicit `--config` path)
//! overrides it key by key.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::classifier::{Classifier, ConfidencePolicy, TrainingConfig};
use crate::error::{Error, Result};
use crate::features::VectorizerConfig;
use crate::models::Category;
use crate::normalize::{Normalizer, RewriteTable};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/tally.toml");

/// Resolved engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub policy: ConfidencePolicy,
    pub features: VectorizerConfig,
    pub training: TrainingConfig,
    /// Pending corrections that trigger a retrain
    pub retrain_batch_size: usize,
    /// Rewrite table overriding the built-in one
    pub rules_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: ConfidencePolicy::default(),
            features: VectorizerConfig::default(),
            training: TrainingConfig::default(),
            retrain_batch_size: 1,
            rules_path: None,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the user override location is
    /// used when present, else the embedded default.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let content = match explicit {
            Some(path) => read_config(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => read_config(&path)?,
                None => DEFAULT_CONFIG.to_string(),
            },
        };
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("Invalid config TOML: {}", e)))?;

        let mut config = Config::default();

        if let Some(classifier) = raw.classifier {
            if let Some(threshold) = classifier.confidence_threshold {
                config.policy.threshold = threshold;
            }
            if let Some(fallback) = classifier.fallback_category {
                config.policy.fallback = Category::parse(&fallback).map_err(|_| {
                    Error::InvalidConfig(format!(
                        "classifier.fallback_category: unknown category '{}'",
                        fallback
                    ))
                })?;
            }
        }

        if let Some(features) = raw.features {
            if let Some(max_features) = features.max_features {
                config.features.max_features = max_features;
            }
            if let Some(max_df) = features.max_df {
                config.features.max_df = max_df;
            }
            if let Some(min_df) = features.min_df {
                config.features.min_df = min_df;
            }
            if let Some(ngram_max) = features.ngram_max {
                config.features.ngram_max = ngram_max;
            }
        }

        if let Some(training) = raw.training {
            if let Some(c) = training.c {
                config.training.c = c;
            }
            if let Some(max_iter) = training.max_iter {
                config.training.max_iter = max_iter;
            }
            if let Some(tolerance) = training.tolerance {
                config.training.tolerance = tolerance;
            }
            if let Some(class_weight) = training.class_weight {
                config.training.class_weight = class_weight
                    .parse()
                    .map_err(|e: String| Error::InvalidConfig(format!("training.class_weight: {}", e)))?;
            }
        }

        if let Some(batch) = raw.feedback.and_then(|f| f.retrain_batch_size) {
            config.retrain_batch_size = batch;
        }

        if let Some(path) = raw.rules.and_then(|r| r.path) {
            config.rules_path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;
        self.features.validate()?;
        self.training.validate()?;
        if self.retrain_batch_size == 0 {
            return Err(Error::InvalidConfig(
                "feedback.retrain_batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The configured rewrite table (override file or built-in)
    pub fn rewrite_table(&self) -> Result<RewriteTable> {
        match &self.rules_path {
            Some(path) => {
                debug!("Loading rewrite table from {}", path.display());
                RewriteTable::from_path(path)
            }
            None => Ok(RewriteTable::builtin()),
        }
    }

    /// Build a classifier from these settings
    pub fn classifier(&self) -> Result<Classifier> {
        Ok(Classifier::new(
            Normalizer::new(self.rewrite_table()?),
            self.features.clone(),
            self.training.clone(),
            self.policy,
        ))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config").join("tally.toml"))
}

fn read_config(path: &Path) -> Result<String> {
    debug!("Reading config from {}", path.display());
    fs::read_to_string(path).map_err(|e| {
        Error::InvalidConfig(format!("Failed to read config {}: {}", path.display(), e))
    })
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    classifier: Option<RawClassifier>,
    features: Option<RawFeatures>,
    training: Option<RawTraining>,
    feedback: Option<RawFeedback>,
    rules: Option<RawRules>,
}

#[derive(Debug, Deserialize)]
struct RawClassifier {
    confidence_threshold: Option<f64>,
    fallback_category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFeatures {
    max_features: Option<usize>,
    max_df: Option<f64>,
    min_df: Option<usize>,
    ngram_max: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawTraining {
    c: Option<f64>,
    max_iter: Option<usize>,
    tolerance: Option<f64>,
    class_weight: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFeedback {
    retrain_batch_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawRules {
    path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassWeight;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = Config::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_toml(
            r#"
            [classifier]
            confidence_threshold = 0.5

            [training]
            class_weight = "none"
            "#,
        )
        .unwrap();
        assert_eq!(config.policy.threshold, 0.5);
        assert_eq!(config.policy.fallback, Category::Other);
        assert_eq!(config.training.class_weight, ClassWeight::None);
        assert_eq!(config.features, VectorizerConfig::default());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_values() {
        assert!(Config::from_toml("[classifier]\nconfidence_threshold = 1.5").is_err());
        assert!(Config::from_toml("[classifier]\nfallback_category = \"Misc\"").is_err());
        assert!(Config::from_toml("[training]\nc = 0.0").is_err());
        assert!(Config::from_toml("[training]\nclass_weight = \"heavy\"").is_err());
        assert!(Config::from_toml("[feedback]\nretrain_batch_size = 0").is_err());
        assert!(Config::from_toml("[features]\nmax_df = 0.0").is_err());
        assert!(Config::from_toml("not toml [").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tally.toml");
        fs::write(&path, "[feedback]\nretrain_batch_size = 5\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.retrain_batch_size, 5);

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_custom_rewrite_table() {
        let dir = TempDir::new().unwrap();
        let rules = dir.path().join("rules.toml");
        fs::write(
            &rules,
            "version = 2\n\n[[rule]]\npattern = \"pho\"\nreplacement = \"noodle soup\"\n",
        )
        .unwrap();

        let config = Config::from_toml(&format!(
            "[rules]\npath = {:?}\n",
            rules.to_string_lossy()
        ))
        .unwrap();
        let classifier = config.classifier().unwrap();
        assert_eq!(classifier.rules_version(), 2);
        assert_eq!(classifier.normalizer().normalize("Pho"), "noodle soup");
    }
}
