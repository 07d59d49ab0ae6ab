//! Prediction and feedback command implementations

use anyhow::{Context, Result};
use tally_core::{Categorizer, Category, Config, Normalizer};

pub fn cmd_categorize(engine: &Categorizer, description: &str, json: bool) -> Result<()> {
    let prediction = engine
        .categorize(description)
        .context("Failed to categorize")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
        return Ok(());
    }

    println!(
        "🏷️  {} ({:.0}% confidence)",
        prediction.category,
        prediction.confidence * 100.0
    );
    if prediction.fallback {
        println!(
            "   Low confidence: best guess was {}",
            prediction.raw_category
        );
    }

    Ok(())
}

pub fn cmd_feedback(
    engine: &Categorizer,
    description: &str,
    category: &str,
    shown: Option<&str>,
) -> Result<()> {
    let outcome = match shown {
        Some(shown) => engine.record_feedback_with_shown(
            description,
            Category::parse(category)?,
            Category::parse(shown)?,
        )?,
        None => engine.record_feedback(description, category)?,
    };

    if !outcome.correction {
        println!("✓ Confirmed: {}", outcome.confirmed);
        return Ok(());
    }

    println!("✏️  Corrected: {} → {}", outcome.shown, outcome.confirmed);
    if outcome.retrained {
        println!("   Model retrained");
        let after = engine.categorize(description)?;
        println!(
            "   Now predicts {} ({:.0}% confidence)",
            after.category,
            after.confidence * 100.0
        );
    } else {
        println!(
            "   {} correction(s) pending before next retrain",
            engine.pending_corrections()
        );
    }

    Ok(())
}

pub fn cmd_normalize(config: &Config, text: &str) -> Result<()> {
    let normalizer = Normalizer::new(config.rewrite_table()?);
    println!("{}", normalizer.normalize(text));
    Ok(())
}
