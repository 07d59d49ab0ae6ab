//! TF-IDF featurization of normalized descriptions
//!
//! Terms are whitespace tokens of at least two characters with English stop
//! words removed, plus n-grams (up to `ngram_max`) over the remaining tokens.
//! The vectorizer learns its vocabulary and IDF weights from the training
//! documents and maps any later text to an L2-normalized sparse vector.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// English stop words (sorted, for binary search)
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during",
    "each", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her",
    "here", "hers", "herself", "him", "himself", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "itself", "just", "me", "more", "most", "my", "myself", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours",
    "ourselves", "out", "over", "own", "same", "she", "should", "so", "some", "such",
    "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "would", "you", "your", "yours", "yourself", "yourselves",
];

fn is_stop_word(token: &str) -> bool {
    ENGLISH_STOP_WORDS.binary_search(&token).is_ok()
}

/// Split normalized text into terms: unigrams first, then bigrams, and so on
pub fn analyze(text: &str, ngram_max: usize) -> Vec<String> {
    let tokens: Vec<&str> = text
        .split_whitespace()
        .filter(|t| t.chars().count() >= 2 && !is_stop_word(t))
        .collect();

    let mut terms: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
    for n in 2..=ngram_max {
        terms.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    terms
}

/// Vectorizer hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Vocabulary cap; the most frequent terms are kept
    pub max_features: usize,
    /// Drop terms whose document frequency exceeds this fraction
    pub max_df: f64,
    /// Drop terms appearing in fewer documents than this
    pub min_df: usize,
    pub ngram_max: usize,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 2000,
            max_df: 0.95,
            min_df: 1,
            ngram_max: 2,
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(Error::InvalidConfig(
                "features.max_features must be at least 1".into(),
            ));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "features.max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        if self.min_df == 0 {
            return Err(Error::InvalidConfig(
                "features.min_df must be at least 1".into(),
            ));
        }
        if !(1..=3).contains(&self.ngram_max) {
            return Err(Error::InvalidConfig(format!(
                "features.ngram_max must be 1, 2 or 3, got {}",
                self.ngram_max
            )));
        }
        Ok(())
    }
}

/// Sparse feature vector as (index, value) pairs sorted by index
pub type SparseVector = Vec<(usize, f64)>;

/// Fitted TF-IDF vectorizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    ngram_max: usize,
    /// Term -> column index (columns are assigned in term order)
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and IDF weights from normalized documents
    pub fn fit(config: &VectorizerConfig, documents: &[String]) -> Result<Self> {
        let n = documents.len();
        if n == 0 {
            return Err(Error::InsufficientData("no documents to fit".into()));
        }

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut term_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let terms = analyze(doc, config.ngram_max);
            for term in &terms {
                *term_freq.entry(term.clone()).or_default() += 1;
            }
            let unique: HashSet<&String> = terms.iter().collect();
            for term in unique {
                *doc_freq.entry(term.clone()).or_default() += 1;
            }
        }

        let max_doc_count = config.max_df * n as f64;
        let mut kept: Vec<(&String, usize)> = doc_freq
            .iter()
            .filter(|&(_, &df)| df as f64 <= max_doc_count && df >= config.min_df)
            .map(|(term, _)| (term, term_freq[term]))
            .collect();

        if kept.is_empty() {
            return Err(Error::InsufficientData(format!(
                "no terms left in vocabulary ({} documents, {} candidate terms)",
                n,
                doc_freq.len()
            )));
        }

        if kept.len() > config.max_features {
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            kept.truncate(config.max_features);
        }

        let mut terms: Vec<&String> = kept.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        let idf = terms
            .iter()
            .map(|term| ((1 + n) as f64 / (1 + doc_freq[*term]) as f64).ln() + 1.0)
            .collect();
        let vocabulary = terms
            .into_iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        Ok(Self {
            ngram_max: config.ngram_max,
            vocabulary,
            idf,
        })
    }

    /// Map normalized text to an L2-normalized TF-IDF vector. Terms outside the
    /// vocabulary are ignored; text with no known terms gives an empty vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in analyze(text, self.ngram_max) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_default() += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();

        let norm = vector.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, v) in vector.iter_mut() {
                *v /= norm;
            }
        }
        vector
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&i| self.idf[i])
    }

    /// Internal consistency check for deserialized vectorizers
    pub(crate) fn is_consistent(&self) -> bool {
        self.vocabulary.len() == self.idf.len()
            && self.vocabulary.values().all(|&i| i < self.idf.len())
    }
}
