//! Part and model number extraction from free text.
//!
//! Rules run against the upper-cased query. The part rule claims its spans
//! first, then each model rule in priority order; a match overlapping an
//! already claimed span is dropped, so no token is captured twice.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use crate::error::{Error, Result};
use crate::types::Identifiers;

static PART_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bPS\d{4,}\b").expect("part number regex"));

static DEFAULT_MODEL_RULES: Lazy<Vec<ModelRule>> = Lazy::new(|| {
    [
        ("letters-digits-letters", r"\b[A-Z]{2,4}\d{3,4}[A-Z]{2,4}\d{0,2}\b"),
        ("digits8-letter-digits3", r"\b\d{8}[A-Z]\d{3}\b"),
        ("digits5-letter-digits3", r"\b\d{5}[A-Z]\d{3}\b"),
        ("digits4-letter-digits3", r"\b\d{4}[A-Z]\d{3}\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| ModelRule {
        name: name.to_string(),
        pattern: Regex::new(pattern).expect("model number regex"),
    })
    .collect()
});

static DEFAULT_EXTRACTOR: Lazy<IdentifierExtractor> = Lazy::new(IdentifierExtractor::default);

/// Extract identifiers with the default rule set.
pub fn extract(query: &str) -> Identifiers {
    DEFAULT_EXTRACTOR.extract(query)
}

/// A named model-number shape.
#[derive(Debug, Clone)]
pub struct ModelRule {
    name: String,
    pattern: Regex,
}

impl ModelRule {
    /// Patterns are matched against upper-case text.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::InvalidConfig(format!("model rule '{name}': {e}")))?;
        Ok(Self { name, pattern })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

#[derive(Debug, Clone)]
pub struct IdentifierExtractor {
    part_rule: Regex,
    model_rules: Vec<ModelRule>,
}

impl Default for IdentifierExtractor {
    fn default() -> Self {
        Self {
            part_rule: PART_NUMBER.clone(),
            model_rules: DEFAULT_MODEL_RULES.clone(),
        }
    }
}

impl IdentifierExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the model rules. Earlier rules take precedence.
    pub fn with_model_rules(mut self, rules: Vec<ModelRule>) -> Self {
        self.model_rules = rules;
        self
    }

    pub fn model_rules(&self) -> &[ModelRule] {
        &self.model_rules
    }

    pub fn extract(&self, query: &str) -> Identifiers {
        let text = query.to_uppercase();
        let mut claimed: Vec<Range<usize>> = Vec::new();

        let mut parts = Vec::new();
        for m in self.part_rule.find_iter(&text) {
            claimed.push(m.range());
            parts.push((m.start(), m.as_str()));
        }

        let mut models = Vec::new();
        for rule in &self.model_rules {
            for m in rule.pattern.find_iter(&text) {
                let span = m.range();
                if claimed.iter().any(|c| overlaps(c, &span)) {
                    continue;
                }
                claimed.push(span);
                models.push((m.start(), m.as_str()));
            }
        }
        models.sort_by_key(|(start, _)| *start);

        Identifiers {
            part_numbers: dedup_in_order(parts),
            model_numbers: dedup_in_order(models),
        }
    }
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

fn dedup_in_order(hits: Vec<(usize, &str)>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(hits.len());
    for (_, value) in hits {
        if !out.iter().any(|v| v == value) {
            out.push(value.to_string());
        }
    }
    out
}
