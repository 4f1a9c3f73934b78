//! Domain types produced per request by retrieval.
//!
//! Everything here is short-lived and owned by the request that built it;
//! only the structured index outlives a request.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::intent::{Appliance, SourceFilter};

/// Upper-cased part number, e.g. `PS11752991`.
pub type PartNumber = String;
/// Upper-cased model number, e.g. `WDT780SAEM1`.
pub type ModelNumber = String;
pub type Metadata = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    PartNumber,
    ModelNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub value: String,
}

/// Identifiers pulled from one query, per kind, in order of appearance and
/// without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    pub part_numbers: Vec<PartNumber>,
    pub model_numbers: Vec<ModelNumber>,
}

impl Identifiers {
    pub fn is_empty(&self) -> bool {
        self.part_numbers.is_empty() && self.model_numbers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.part_numbers.len() + self.model_numbers.len()
    }

    /// Every extracted identifier, parts first.
    pub fn iter(&self) -> impl Iterator<Item = Identifier> + '_ {
        let parts = self
            .part_numbers
            .iter()
            .map(|v| Identifier { kind: IdentifierKind::PartNumber, value: v.clone() });
        let models = self
            .model_numbers
            .iter()
            .map(|v| Identifier { kind: IdentifierKind::ModelNumber, value: v.clone() });
        parts.chain(models)
    }

    /// True when a part/model cross-check is possible.
    pub fn has_part_and_model(&self) -> bool {
        !self.part_numbers.is_empty() && !self.model_numbers.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    High,
    VeryHigh,
}

/// One installation manual record keyed by part number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntry {
    #[serde(default)]
    pub title: String,
    #[serde(alias = "installationText")]
    pub installation_text: String,
    #[serde(default)]
    pub url: String,
}

/// A hit from the structured index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectMatch {
    PartToModels {
        part: PartNumber,
        models: Vec<ModelNumber>,
        count: usize,
    },
    ModelToParts {
        model: ModelNumber,
        parts: Vec<PartNumber>,
        count: usize,
    },
    CrossCheck {
        part: PartNumber,
        model: ModelNumber,
        is_compatible: bool,
        confidence: Confidence,
    },
    InstallationManual {
        part: PartNumber,
        title: String,
        text: String,
        url: String,
        confidence: Confidence,
    },
}

impl DirectMatch {
    pub fn part_to_models(part: impl Into<PartNumber>, models: Vec<ModelNumber>) -> Self {
        let count = models.len();
        DirectMatch::PartToModels { part: part.into(), models, count }
    }

    pub fn model_to_parts(model: impl Into<ModelNumber>, parts: Vec<PartNumber>) -> Self {
        let count = parts.len();
        DirectMatch::ModelToParts { model: model.into(), parts, count }
    }

    pub fn installation_manual(part: impl Into<PartNumber>, entry: &ManualEntry) -> Self {
        DirectMatch::InstallationManual {
            part: part.into(),
            title: entry.title.clone(),
            text: entry.installation_text.clone(),
            url: entry.url.clone(),
            confidence: Confidence::VeryHigh,
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            DirectMatch::PartToModels { .. } | DirectMatch::ModelToParts { .. } => Confidence::High,
            DirectMatch::CrossCheck { confidence, .. }
            | DirectMatch::InstallationManual { confidence, .. } => *confidence,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DirectMatch::PartToModels { .. } => "part_to_models",
            DirectMatch::ModelToParts { .. } => "model_to_parts",
            DirectMatch::CrossCheck { .. } => "cross_check",
            DirectMatch::InstallationManual { .. } => "installation_manual",
        }
    }
}

/// A hit from the vector store. `distance` is the raw distance reported by
/// the backend; lower is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticMatch {
    pub document_id: String,
    pub text: String,
    pub metadata: Metadata,
    pub distance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    DirectLookup,
    SemanticSearch,
}

/// Filter sent with every vector query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticFilter {
    pub source: SourceFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appliance: Option<Appliance>,
}

impl SemanticFilter {
    pub fn new(source: SourceFilter, appliance: Option<Appliance>) -> Self {
        Self { source, appliance }
    }
}

/// Column-major answer of the vector store: one row per query text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub ids: Vec<Vec<String>>,
    pub documents: Vec<Vec<String>>,
    pub metadatas: Vec<Vec<Metadata>>,
    pub distances: Vec<Vec<f32>>,
}

impl QueryResponse {
    /// The empty-shaped answer for a single query text.
    pub fn empty() -> Self {
        Self {
            ids: vec![Vec::new()],
            documents: vec![Vec::new()],
            metadatas: vec![Vec::new()],
            distances: vec![Vec::new()],
        }
    }
}

/// Why a semantic search produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SemanticFailure {
    Backend(String),
    Timeout { after_ms: u64 },
    Malformed(String),
    Disabled,
}

impl fmt::Display for SemanticFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticFailure::Backend(msg) => write!(f, "backend error: {msg}"),
            SemanticFailure::Timeout { after_ms } => write!(f, "timed out after {after_ms}ms"),
            SemanticFailure::Malformed(msg) => write!(f, "malformed response: {msg}"),
            SemanticFailure::Disabled => f.write_str("semantic search disabled"),
        }
    }
}

/// Result of one semantic search. `Matches(vec![])` is a genuine absence of
/// data; `Degraded` means the backend could not answer.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticOutcome {
    Matches(Vec<SemanticMatch>),
    Degraded(SemanticFailure),
}

impl SemanticOutcome {
    pub fn matches(&self) -> &[SemanticMatch] {
        match self {
            SemanticOutcome::Matches(m) => m,
            SemanticOutcome::Degraded(_) => &[],
        }
    }

    pub fn failure(&self) -> Option<&SemanticFailure> {
        match self {
            SemanticOutcome::Matches(_) => None,
            SemanticOutcome::Degraded(f) => Some(f),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SemanticOutcome::Degraded(_))
    }

    pub fn into_parts(self) -> (Vec<SemanticMatch>, Option<SemanticFailure>) {
        match self {
            SemanticOutcome::Matches(m) => (m, None),
            SemanticOutcome::Degraded(f) => (Vec::new(), Some(f)),
        }
    }
}

/// Everything retrieval found for one query, handed to answer generation.
///
/// `strategies_used` is computed from the two match lists at construction
/// and cannot be set any other way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedResult {
    query: String,
    identifiers: Identifiers,
    direct_matches: Vec<DirectMatch>,
    semantic_matches: Vec<SemanticMatch>,
    strategies_used: BTreeSet<Strategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    semantic_failure: Option<SemanticFailure>,
}

impl CombinedResult {
    pub fn new(
        query: impl Into<String>,
        identifiers: Identifiers,
        direct_matches: Vec<DirectMatch>,
        semantic_matches: Vec<SemanticMatch>,
    ) -> Self {
        let mut strategies_used = BTreeSet::new();
        if !direct_matches.is_empty() {
            strategies_used.insert(Strategy::DirectLookup);
        }
        if !semantic_matches.is_empty() {
            strategies_used.insert(Strategy::SemanticSearch);
        }
        Self {
            query: query.into(),
            identifiers,
            direct_matches,
            semantic_matches,
            strategies_used,
            semantic_failure: None,
        }
    }

    pub fn empty(query: impl Into<String>) -> Self {
        Self::new(query, Identifiers::default(), Vec::new(), Vec::new())
    }

    /// Attach the diagnostic for a degraded semantic search.
    pub fn with_semantic_failure(mut self, failure: Option<SemanticFailure>) -> Self {
        self.semantic_failure = failure;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn identifiers(&self) -> &Identifiers {
        &self.identifiers
    }

    pub fn direct_matches(&self) -> &[DirectMatch] {
        &self.direct_matches
    }

    pub fn semantic_matches(&self) -> &[SemanticMatch] {
        &self.semantic_matches
    }

    pub fn strategies_used(&self) -> &BTreeSet<Strategy> {
        &self.strategies_used
    }

    pub fn used(&self, strategy: Strategy) -> bool {
        self.strategies_used.contains(&strategy)
    }

    pub fn semantic_failure(&self) -> Option<&SemanticFailure> {
        self.semantic_failure.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.direct_matches.is_empty() && self.semantic_matches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn semantic(id: &str, distance: f32) -> SemanticMatch {
        SemanticMatch {
            document_id: id.to_string(),
            text: "door gasket replacement".to_string(),
            metadata: Metadata::new(),
            distance,
        }
    }

    #[test]
    fn strategies_follow_contents() {
        let none = CombinedResult::empty("hello");
        assert!(none.strategies_used().is_empty());

        let direct = CombinedResult::new(
            "q",
            Identifiers::default(),
            vec![DirectMatch::part_to_models("PS1", vec!["M1".into()])],
            vec![],
        );
        assert_eq!(direct.strategies_used().iter().copied().collect::<Vec<_>>(), vec![Strategy::DirectLookup]);

        let both = CombinedResult::new(
            "q",
            Identifiers::default(),
            vec![DirectMatch::model_to_parts("M1", vec!["PS1".into()])],
            vec![semantic("a", 0.2)],
        );
        assert!(both.used(Strategy::DirectLookup));
        assert!(both.used(Strategy::SemanticSearch));
    }

    #[test]
    fn single_sided_lookups_are_high_confidence() {
        let m = DirectMatch::part_to_models("PS10065979", vec!["66512762K314".into(), "WDT780SAEM1".into()]);
        assert_eq!(m.confidence(), Confidence::High);
        match m {
            DirectMatch::PartToModels { count, .. } => assert_eq!(count, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn direct_match_serializes_with_type_tag() {
        let m = DirectMatch::CrossCheck {
            part: "PS10065979".into(),
            model: "66512762K314".into(),
            is_compatible: true,
            confidence: Confidence::VeryHigh,
        };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["type"], "cross_check");
        assert_eq!(v["confidence"], "VERY_HIGH");
        assert_eq!(v["is_compatible"], true);
    }

    #[test]
    fn degraded_outcome_has_no_matches() {
        let outcome = SemanticOutcome::Degraded(SemanticFailure::Timeout { after_ms: 50 });
        assert!(outcome.matches().is_empty());
        assert!(outcome.is_degraded());
        let (matches, failure) = outcome.into_parts();
        assert!(matches.is_empty());
        assert_eq!(failure, Some(SemanticFailure::Timeout { after_ms: 50 }));
    }

    #[test]
    fn identifiers_iterate_parts_then_models() {
        let ids = Identifiers {
            part_numbers: vec!["PS1234".into()],
            model_numbers: vec!["WDT780SAEM1".into()],
        };
        let kinds: Vec<IdentifierKind> = ids.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IdentifierKind::PartNumber, IdentifierKind::ModelNumber]);
        assert!(ids.has_part_and_model());
        assert_eq!(ids.len(), 2);
    }
}
