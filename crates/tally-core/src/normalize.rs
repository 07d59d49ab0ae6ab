//! Text normalizer for expense descriptions
//!
//! Turns a raw description into canonical text:
//! 1. lowercase and trim
//! 2. replace anything that is not a letter, digit, or whitespace with a space
//! 3. collapse whitespace
//! 4. rewrite brand/vendor names to category-indicative phrases
//!
//! ## Rewrite semantics
//!
//! Rules come from a versioned [`RewriteTable`] and run once each, in table
//! order, over the whole string. Every occurrence of a pattern is replaced
//! (plain substring match, not token boundaries). Text produced by a rule, and
//! canonical phrases already present in the input, are protected: later rules
//! never match inside them. That makes the first matching rule in table order
//! win on overlapping text, and keeps `normalize` idempotent.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default rewrite table (compiled into binary)
const DEFAULT_RULES: &str = include_str!("../../../config/rewrite_rules.toml");

/// Upper bound on rewrite passes before the output is considered stable
const MAX_PASSES: usize = 4;

/// Maps a brand/vendor substring to a canonical phrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    pub pattern: String,
    pub replacement: String,
}

impl RewriteRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Ordered, versioned list of rewrite rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteTable {
    version: u32,
    #[serde(rename = "rule", default)]
    rules: Vec<RewriteRule>,
}

impl RewriteTable {
    /// Build a table, validating every rule
    pub fn new(version: u32, rules: Vec<RewriteRule>) -> Result<Self> {
        let table = Self { version, rules };
        table.validate()?;
        Ok(table)
    }

    /// The built-in table shipped with the binary
    pub fn builtin() -> Self {
        Self::from_toml(DEFAULT_RULES).expect("built-in rewrite table is valid")
    }

    /// Parse a table from TOML (`version = N` plus `[[rule]]` entries)
    pub fn from_toml(content: &str) -> Result<Self> {
        let table: RewriteTable = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("Invalid rewrite table TOML: {}", e)))?;
        table.validate()?;
        Ok(table)
    }

    /// Load a table from a TOML file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read rewrite table {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Patterns and replacements must already be in cleaned form, otherwise a
    /// pattern can never match and a replacement would change on the next pass.
    fn validate(&self) -> Result<()> {
        for (i, rule) in self.rules.iter().enumerate() {
            if rule.pattern.is_empty() || rule.replacement.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "Rewrite rule {} has an empty pattern or replacement",
                    i + 1
                )));
            }
            for text in [&rule.pattern, &rule.replacement] {
                if !is_clean(text) {
                    return Err(Error::InvalidConfig(format!(
                        "Rewrite rule {} contains '{}', which is not lowercase \
                        letters/digits separated by single spaces",
                        i + 1,
                        text
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for RewriteTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn is_clean(text: &str) -> bool {
    text == text.trim()
        && !text.contains("  ")
        && text
            .chars()
            .all(|c| c == ' ' || (c.is_alphanumeric() && !c.is_uppercase()))
}

/// Segment of text during a rewrite pass
enum Piece<'a> {
    /// Not yet claimed by any rule
    Raw(String),
    /// Canonical phrase; later rules skip it
    Fixed(&'a str),
}

impl Piece<'_> {
    fn as_str(&self) -> &str {
        match self {
            Piece::Raw(text) => text,
            Piece::Fixed(text) => text,
        }
    }
}

/// Replace every occurrence of `pattern` inside raw pieces with `replacement`
fn apply_rule<'a>(pieces: Vec<Piece<'a>>, pattern: &str, replacement: &'a str) -> Vec<Piece<'a>> {
    let mut out = Vec::with_capacity(pieces.len());
    for piece in pieces {
        match piece {
            Piece::Raw(text) if text.contains(pattern) => {
                for (i, part) in text.split(pattern).enumerate() {
                    if i > 0 {
                        out.push(Piece::Fixed(replacement));
                    }
                    if !part.trim().is_empty() {
                        out.push(Piece::Raw(part.to_string()));
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Deterministic description normalizer
#[derive(Debug, Clone)]
pub struct Normalizer {
    table: RewriteTable,
    /// Distinct replacement phrases, longest first
    protected: Vec<String>,
    strip_re: Regex,
    space_re: Regex,
}

impl Normalizer {
    pub fn new(table: RewriteTable) -> Self {
        let mut protected: Vec<String> = table
            .rules()
            .iter()
            .map(|r| r.replacement.clone())
            .collect();
        protected.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        protected.dedup();

        Self {
            table,
            protected,
            strip_re: Regex::new(r"[^\p{L}\p{N}\s]").expect("valid regex"),
            space_re: Regex::new(r"\s+").expect("valid regex"),
        }
    }

    pub fn table(&self) -> &RewriteTable {
        &self.table
    }

    /// Normalize a raw description. Never fails; empty input gives empty output.
    pub fn normalize(&self, raw: &str) -> String {
        let mut text = self.clean(raw);
        if text.is_empty() {
            return text;
        }

        for _ in 0..MAX_PASSES {
            let next = self.rewrite_pass(&text);
            if next == text {
                break;
            }
            text = next;
        }
        text
    }

    /// Lowercase, strip punctuation, collapse whitespace
    fn clean(&self, raw: &str) -> String {
        let lowered = raw.trim().to_lowercase();
        let stripped = self.strip_re.replace_all(&lowered, " ");
        self.collapse(&stripped)
    }

    fn collapse(&self, text: &str) -> String {
        self.space_re.replace_all(text.trim(), " ").into_owned()
    }

    fn rewrite_pass(&self, text: &str) -> String {
        let mut pieces = vec![Piece::Raw(text.to_string())];

        for phrase in &self.protected {
            pieces = apply_rule(pieces, phrase, phrase);
        }
        for rule in self.table.rules() {
            pieces = apply_rule(pieces, &rule.pattern, &rule.replacement);
        }

        let joined = pieces
            .iter()
            .map(Piece::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        self.collapse(&joined)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(RewriteTable::builtin())
    }
}

/// Normalize with the built-in rewrite table
pub fn normalize(raw: &str) -> String {
    static DEFAULT: OnceLock<Normalizer> = OnceLock::new();
    DEFAULT.get_or_init(Normalizer::default).normalize(raw)
}
