//! Accuracy evaluation against labeled examples

use serde::Serialize;

use crate::classifier::{Classifier, FittedModel};
use crate::error::{Error, Result};
use crate::models::{Category, LabeledExample, Prediction};

/// Precision/recall for one category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryMetrics {
    pub category: Category,
    /// Examples labeled with this category
    pub support: usize,
    /// Examples predicted as this category
    pub predicted: usize,
    pub true_positives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Misclassification {
    pub text: String,
    pub expected: Category,
    pub predicted: Category,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    /// Predictions that fell back to the fallback category
    pub fallbacks: usize,
    /// Categories that appear as a label or a prediction, in enumeration order
    pub per_category: Vec<CategoryMetrics>,
    pub misses: Vec<Misclassification>,
}

impl EvaluationReport {
    /// Build a report from (example, prediction) pairs
    pub fn from_outcomes(outcomes: &[(LabeledExample, Prediction)]) -> Self {
        let total = outcomes.len();
        let correct = outcomes
            .iter()
            .filter(|(e, p)| e.category == p.category)
            .count();
        let fallbacks = outcomes.iter().filter(|(_, p)| p.fallback).count();

        let per_category = Category::all()
            .iter()
            .filter_map(|&category| {
                let support = outcomes.iter().filter(|(e, _)| e.category == category).count();
                let predicted = outcomes.iter().filter(|(_, p)| p.category == category).count();
                if support == 0 && predicted == 0 {
                    return None;
                }
                let true_positives = outcomes
                    .iter()
                    .filter(|(e, p)| e.category == category && p.category == category)
                    .count();
                let precision = ratio(true_positives, predicted);
                let recall = ratio(true_positives, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                Some(CategoryMetrics {
                    category,
                    support,
                    predicted,
                    true_positives,
                    precision,
                    recall,
                    f1,
                })
            })
            .collect();

        let misses = outcomes
            .iter()
            .filter(|(e, p)| e.category != p.category)
            .map(|(e, p)| Misclassification {
                text: e.text.clone(),
                expected: e.category,
                predicted: p.category,
                confidence: p.confidence,
            })
            .collect();

        Self {
            total,
            correct,
            accuracy: ratio(correct, total),
            fallbacks,
            per_category,
            misses,
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Score `model` on labeled examples (shown category vs label)
pub fn evaluate(
    classifier: &Classifier,
    model: &FittedModel,
    examples: &[LabeledExample],
) -> EvaluationReport {
    let outcomes: Vec<(LabeledExample, Prediction)> = examples
        .iter()
        .map(|e| (e.clone(), classifier.predict(model, &e.text)))
        .collect();
    EvaluationReport::from_outcomes(&outcomes)
}

/// Deterministic per-category split into (train, test).
///
/// Each category contributes `round(n * test_fraction)` evenly spaced examples
/// to the test side, always leaving at least one for training.
pub fn stratified_split(
    examples: &[LabeledExample],
    test_fraction: f64,
) -> Result<(Vec<LabeledExample>, Vec<LabeledExample>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::InvalidConfig(format!(
            "holdout fraction must be between 0 and 1, got {}",
            test_fraction
        )));
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for &category in Category::all() {
        let items: Vec<&LabeledExample> =
            examples.iter().filter(|e| e.category == category).collect();
        let n = items.len();
        if n == 0 {
            continue;
        }
        let n_test = ((n as f64 * test_fraction).round() as usize).min(n - 1);

        for (i, example) in items.into_iter().enumerate() {
            if (i + 1) * n_test / n > i * n_test / n {
                test.push(example.clone());
            } else {
                train.push(example.clone());
            }
        }
    }

    Ok((train, test))
}

const BENCHMARK: &[(&str, Category)] = &[
    ("McDonald's lunch", Category::Food),
    ("Starbucks coffee", Category::Food),
    ("Grocery shopping at Walmart", Category::Food),
    ("Pizza delivery", Category::Food),
    ("Restaurant dinner", Category::Food),
    ("Whole Foods market", Category::Food),
    ("Bar drinks", Category::Food),
    ("Uber ride to airport", Category::Transport),
    ("Gas at Shell station", Category::Transport),
    ("Parking meter downtown", Category::Transport),
    ("Car oil change", Category::Transport),
    ("Flight to New York", Category::Transport),
    ("Metro card refill", Category::Transport),
    ("Taxi fare", Category::Transport),
    ("Netflix monthly subscription", Category::Entertainment),
    ("Movie theater tickets", Category::Entertainment),
    ("Concert at venue", Category::Entertainment),
    ("Video game purchase", Category::Entertainment),
    ("Gym membership", Category::Entertainment),
    ("Book at Barnes Noble", Category::Entertainment),
    ("Amazon online purchase", Category::Shopping),
    ("Clothes at Target", Category::Shopping),
    ("Best Buy electronics", Category::Shopping),
    ("Home Depot supplies", Category::Shopping),
    ("Birthday gift", Category::Shopping),
    ("New shoes", Category::Shopping),
    ("Electric bill payment", Category::Bills),
    ("Internet bill Comcast", Category::Bills),
    ("Cell phone bill Verizon", Category::Bills),
    ("Rent payment", Category::Bills),
    ("Car insurance premium", Category::Bills),
    ("Credit card payment", Category::Bills),
    ("Doctor appointment", Category::Healthcare),
    ("Pharmacy prescription", Category::Healthcare),
    ("Dental cleaning", Category::Healthcare),
    ("Eye exam", Category::Healthcare),
    ("Hospital visit", Category::Healthcare),
    ("Physical therapy", Category::Healthcare),
    ("Bank ATM fee", Category::Other),
    ("Charity donation", Category::Other),
    ("Pet veterinarian", Category::Other),
    ("Legal consultation", Category::Other),
    ("Investment transfer", Category::Other),
];

/// Held-out benchmark battery of realistic descriptions
pub fn benchmark_examples() -> Vec<LabeledExample> {
    BENCHMARK
        .iter()
        .map(|&(text, category)| LabeledExample::seed(text, category))
        .collect()
}
