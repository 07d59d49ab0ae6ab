//! Domain models for Tally

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Spending category (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Shopping,
    Bills,
    Healthcare,
    /// Catch-all, also used when the classifier is not confident
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Entertainment => "Entertainment",
            Self::Shopping => "Shopping",
            Self::Bills => "Bills",
            Self::Healthcare => "Healthcare",
            Self::Other => "Other",
        }
    }

    /// All categories in enumeration order
    pub fn all() -> &'static [Category] {
        &[
            Self::Food,
            Self::Transport,
            Self::Entertainment,
            Self::Shopping,
            Self::Bills,
            Self::Healthcare,
            Self::Other,
        ]
    }

    /// Parse a category name, returning `Error::UnknownCategory` on failure
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
            .map_err(|_| Error::UnknownCategory(s.trim().to_string()))
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" => Ok(Self::Food),
            "transport" | "transportation" => Ok(Self::Transport),
            "entertainment" => Ok(Self::Entertainment),
            "shopping" => Ok(Self::Shopping),
            "bills" => Ok(Self::Bills),
            "healthcare" => Ok(Self::Healthcare),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a labeled example came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExampleSource {
    /// Hand-authored bootstrap data
    #[default]
    Seed,
    /// User overrode a shown prediction
    Correction,
    /// Bulk-loaded from a labeled CSV
    Import,
}

impl ExampleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Correction => "correction",
            Self::Import => "import",
        }
    }
}

impl std::str::FromStr for ExampleSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "seed" => Ok(Self::Seed),
            "correction" => Ok(Self::Correction),
            "import" => Ok(Self::Import),
            _ => Err(format!("Unknown example source: {}", s)),
        }
    }
}

impl std::fmt::Display for ExampleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A (description, category) training pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub text: String,
    pub category: Category,
    pub source: ExampleSource,
}

impl LabeledExample {
    pub fn new(text: impl Into<String>, category: Category, source: ExampleSource) -> Self {
        Self {
            text: text.into(),
            category,
            source,
        }
    }

    pub fn seed(text: impl Into<String>, category: Category) -> Self {
        Self::new(text, category, ExampleSource::Seed)
    }

    pub fn correction(text: impl Into<String>, category: Category) -> Self {
        Self::new(text, category, ExampleSource::Correction)
    }
}

/// Probability assigned to one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub probability: f64,
}

/// Classifier output for one description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Category to show (after the confidence policy)
    pub category: Category,
    /// Probability of the top-ranked category
    pub confidence: f64,
    /// Top-ranked category before the confidence policy
    pub raw_category: Category,
    /// True when confidence fell below the threshold and the fallback was shown
    pub fallback: bool,
    /// Per-category probabilities, in model class order
    pub probabilities: Vec<CategoryScore>,
}

impl Prediction {
    /// Probability the model assigned to `category` (0 if the model has no such class)
    pub fn probability_of(&self, category: Category) -> f64 {
        self.probabilities
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.probability)
            .unwrap_or(0.0)
    }
}

/// Result of a `record_feedback` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOutcome {
    pub confirmed: Category,
    /// Category the user was shown for this description
    pub shown: Category,
    /// True when the confirmed category differs from the shown one
    pub correction: bool,
    /// True when this call triggered a retrain
    pub retrained: bool,
}

/// A correction as stored by a corpus store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCorrection {
    pub id: i64,
    pub example: LabeledExample,
    pub shown: Option<Category>,
    pub created_at: DateTime<Utc>,
}
