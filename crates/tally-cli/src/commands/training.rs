//! Model training, evaluation and import command implementations

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use tally_core::corpus::parse_labeled_csv;
use tally_core::{
    benchmark_examples, evaluate, stratified_split, Categorizer, EvaluationReport,
    ExampleSource,
};

use super::truncate;

pub fn cmd_train(engine: &Categorizer) -> Result<()> {
    println!("🧠 Training model...");

    let model = engine.retrain().context("Training failed")?;
    let metadata = model.metadata();

    println!("✅ Trained on {} examples", metadata.example_count);
    println!("   Classes:    {}", model.classes().len());
    println!("   Vocabulary: {} terms", model.vocabulary_len());
    println!(
        "   Optimizer:  {} iterations{}",
        metadata.iterations,
        if metadata.converged { "" } else { " (not converged)" }
    );

    Ok(())
}

pub fn cmd_eval(
    engine: &Categorizer,
    file: Option<&Path>,
    holdout: Option<f64>,
    json: bool,
) -> Result<()> {
    let classifier = engine.classifier();

    let (label, report) = if let Some(fraction) = holdout {
        let corpus = engine.corpus()?;
        let (train, test) = stratified_split(&corpus.to_vec(), fraction)?;
        let model = classifier
            .train_examples(&train)
            .context("Training on holdout split failed")?;
        (
            format!("holdout ({} train / {} test)", train.len(), test.len()),
            evaluate(classifier, &model, &test),
        )
    } else {
        let examples = match file {
            Some(path) => {
                let f = File::open(path)
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                parse_labeled_csv(f, ExampleSource::Import)?
            }
            None => benchmark_examples(),
        };
        let model = engine.ensure_model()?;
        let label = match file {
            Some(path) => path.display().to_string(),
            None => "built-in benchmark".to_string(),
        };
        (label, evaluate(classifier, &model, &examples))
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&label, &report);
    Ok(())
}

fn print_report(label: &str, report: &EvaluationReport) {
    println!();
    println!("📈 Evaluation: {}", label);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   Accuracy: {:.1}% ({}/{})",
        report.accuracy * 100.0,
        report.correct,
        report.total
    );
    println!("   Fallbacks: {}", report.fallbacks);
    println!();
    println!(
        "   {:<14} {:>8} {:>10} {:>8} {:>8}",
        "Category", "Support", "Precision", "Recall", "F1"
    );
    for m in &report.per_category {
        println!(
            "   {:<14} {:>8} {:>10.2} {:>8.2} {:>8.2}",
            m.category.as_str(),
            m.support,
            m.precision,
            m.recall,
            m.f1
        );
    }

    if !report.misses.is_empty() {
        println!();
        println!("   Misclassified:");
        for miss in &report.misses {
            println!(
                "   ❌ {:<36} expected {:<13} got {} ({:.0}%)",
                truncate(&miss.text, 36),
                miss.expected.as_str(),
                miss.predicted,
                miss.confidence * 100.0
            );
        }
    }
}

pub fn cmd_import(engine: &Categorizer, file: &Path) -> Result<()> {
    println!("📥 Importing {}...", file.display());

    let f = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let examples = parse_labeled_csv(f, ExampleSource::Import).context("Failed to parse CSV")?;

    if examples.is_empty() {
        println!("   No labeled rows found");
        return Ok(());
    }

    let count = engine.import_examples(&examples)?;
    println!("✅ Imported {} examples and retrained", count);

    Ok(())
}
