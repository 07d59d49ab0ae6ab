//! Status-related command implementations (status, categories, rules, corrections)

use anyhow::Result;
use tally_core::{Categorizer, Category, Config, Database};

use super::truncate;

pub fn cmd_status(engine: &Categorizer, json: bool) -> Result<()> {
    let status = engine.status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("📊 Tally Status");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Artifact: {}", status.artifact_location);

    match &status.model {
        Some(model) => {
            println!(
                "   Model:    trained {} on {} examples",
                model.trained_at.format("%Y-%m-%d %H:%M:%S UTC"),
                model.example_count
            );
            println!(
                "             {} classes, {} terms, rewrite table v{}",
                status.classes.len(),
                status.vocabulary_size,
                model.rules_version
            );
            if status.stale {
                println!("   ⚠️  Model is out of date; it will retrain on next use");
            }
        }
        None => println!("   Model:    (not trained yet)"),
    }

    println!();
    println!(
        "   Corpus: {} examples ({} seed, {} accumulated)",
        status.corpus.total, status.corpus.seed, status.corpus.accumulated
    );
    for (category, count) in &status.corpus.by_category {
        println!("     {:<14} {}", category.as_str(), count);
    }
    println!(
        "   Retrain after {} correction(s)",
        status.retrain_batch_size
    );

    Ok(())
}

pub fn cmd_categories() -> Result<()> {
    for category in Category::all() {
        println!("{}", category);
    }
    Ok(())
}

pub fn cmd_rules(config: &Config) -> Result<()> {
    let table = config.rewrite_table()?;
    println!(
        "📖 Rewrite table v{} ({} rules, applied in order)",
        table.version(),
        table.len()
    );
    for rule in table.rules() {
        println!("   {:<18} → {}", rule.pattern, rule.replacement);
    }
    Ok(())
}

pub fn cmd_corrections(db: &Database, limit: i64) -> Result<()> {
    let corrections = db.list_corrections(Some(limit))?;

    if corrections.is_empty() {
        println!("No corrections recorded yet");
        return Ok(());
    }

    println!(
        "   {:<20} {:<36} {:<14} {}",
        "When", "Description", "Shown", "Confirmed"
    );
    for c in &corrections {
        println!(
            "   {:<20} {:<36} {:<14} {}",
            c.created_at.format("%Y-%m-%d %H:%M:%S"),
            truncate(&c.example.text, 36),
            c.shown.map(|s| s.as_str()).unwrap_or("-"),
            c.example.category
        );
    }
    println!();
    println!("   {} total", db.count_corrections()?);

    Ok(())
}
