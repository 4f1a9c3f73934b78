//! Retrieval Fusion Engine: structured lookups per pipeline and the merge
//! of direct and semantic results.

use partfinder_core::types::{CombinedResult, Confidence, DirectMatch, Identifiers, SemanticOutcome};
use partfinder_index::StructuredIndex;

use crate::pipeline::Pipeline;

/// Structured-index matches for one pipeline.
///
/// Compatibility emits part->models, model->parts and then cross-checks;
/// installation emits manual entries. The other pipelines have no
/// structured sub-index.
pub fn direct_lookup(index: &StructuredIndex, pipeline: Pipeline, identifiers: &Identifiers) -> Vec<DirectMatch> {
    match pipeline {
        Pipeline::Compatibility => {
            let mut out = Vec::new();
            for part in &identifiers.part_numbers {
                let models = index.lookup_part(part);
                if !models.is_empty() {
                    out.push(DirectMatch::part_to_models(part.clone(), models.to_vec()));
                }
            }
            for model in &identifiers.model_numbers {
                let parts = index.lookup_model(model);
                if !parts.is_empty() {
                    out.push(DirectMatch::model_to_parts(model.clone(), parts.to_vec()));
                }
            }
            out.extend(cross_checks(index, identifiers));
            out
        }
        Pipeline::Installation => identifiers
            .part_numbers
            .iter()
            .filter_map(|part| {
                index
                    .lookup_manual(part)
                    .map(|entry| DirectMatch::installation_manual(part.clone(), entry))
            })
            .collect(),
        Pipeline::Troubleshooting | Pipeline::General => Vec::new(),
    }
}

/// Compatibility verdict for every extracted (part, model) pair whose part
/// is in the index. Unknown parts give no verdict rather than a false
/// "incompatible".
pub fn cross_checks(index: &StructuredIndex, identifiers: &Identifiers) -> Vec<DirectMatch> {
    if !identifiers.has_part_and_model() {
        return Vec::new();
    }
    let mut out = Vec::new();
    for part in &identifiers.part_numbers {
        if !index.knows_part(part) {
            continue;
        }
        for model in &identifiers.model_numbers {
            out.push(DirectMatch::CrossCheck {
                part: part.clone(),
                model: model.clone(),
                is_compatible: index.is_compatible(part, model),
                confidence: Confidence::VeryHigh,
            });
        }
    }
    out
}

/// Merge both sources. Direct matches are kept in full and come first;
/// semantic matches are appended as a supplement, never filtered against
/// the direct ones.
pub fn fuse(
    query: &str,
    identifiers: Identifiers,
    direct_matches: Vec<DirectMatch>,
    semantic: SemanticOutcome,
) -> CombinedResult {
    let (semantic_matches, failure) = semantic.into_parts();
    CombinedResult::new(query, identifiers, direct_matches, semantic_matches).with_semantic_failure(failure)
}
