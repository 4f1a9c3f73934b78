use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use partfinder_core::config::{KSettings, RetrievalSettings};
use partfinder_core::traits::SemanticBackend;
use partfinder_core::types::{CombinedResult, SemanticFilter};
use partfinder_core::{Appliance, IdentifierExtractor, Intent};
use partfinder_index::StructuredIndex;

use crate::fusion::{direct_lookup, fuse};
use crate::pipeline::Pipeline;
use crate::semantic::SemanticSearchClient;

/// Per-call overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrieveOptions {
    pub appliance: Option<Appliance>,
    /// Replaces the pipeline's configured result count.
    pub k: Option<usize>,
}

/// Built once at startup and shared by reference; holds no per-request
/// state.
pub struct RetrievalService {
    index: Arc<StructuredIndex>,
    extractor: IdentifierExtractor,
    semantic: SemanticSearchClient,
    k: KSettings,
}

impl RetrievalService {
    pub fn new(index: Arc<StructuredIndex>, semantic: SemanticSearchClient) -> Self {
        Self {
            index,
            extractor: IdentifierExtractor::default(),
            semantic,
            k: KSettings::default(),
        }
    }

    /// Wire from configuration. `semantic_enabled = false` swaps in a
    /// disabled client regardless of the backend passed.
    pub fn from_settings(
        index: Arc<StructuredIndex>,
        backend: Option<Arc<dyn SemanticBackend>>,
        settings: &RetrievalSettings,
    ) -> Self {
        let semantic = match backend {
            Some(b) if settings.semantic_enabled => {
                SemanticSearchClient::new(b, Duration::from_millis(settings.semantic_timeout_ms))
            }
            _ => SemanticSearchClient::disabled(),
        };
        Self::new(index, semantic).with_k(settings.k)
    }

    pub fn with_k(mut self, k: KSettings) -> Self {
        self.k = k;
        self
    }

    pub fn with_extractor(mut self, extractor: IdentifierExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn index(&self) -> &StructuredIndex {
        &self.index
    }

    pub fn semantic(&self) -> &SemanticSearchClient {
        &self.semantic
    }

    pub async fn retrieve(&self, intent: Intent, query: &str) -> CombinedResult {
        self.retrieve_with(intent, query, RetrieveOptions::default()).await
    }

    /// Run the pipeline for `intent`. `out_of_scope` returns an empty result
    /// without extracting, looking anything up or querying the vector store.
    pub async fn retrieve_with(&self, intent: Intent, query: &str, opts: RetrieveOptions) -> CombinedResult {
        let Some(pipeline) = Pipeline::for_intent(intent) else {
            debug!(intent = %intent, "no pipeline for intent");
            return CombinedResult::empty(query);
        };
        let started = Instant::now();
        let identifiers = self.extractor.extract(query);
        let filter = SemanticFilter::new(pipeline.source(), opts.appliance);
        let k = opts.k.unwrap_or_else(|| self.k.for_source(pipeline.source()));

        let structured = async { direct_lookup(&self.index, pipeline, &identifiers) };
        let (direct, semantic) = tokio::join!(structured, self.semantic.search(query, filter, k));

        let result = fuse(query, identifiers, direct, semantic);
        info!(
            intent = %intent,
            pipeline = %pipeline,
            parts = result.identifiers().part_numbers.len(),
            models = result.identifiers().model_numbers.len(),
            direct = result.direct_matches().len(),
            hits = result.semantic_matches().len(),
            degraded = result.semantic_failure().is_some(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "retrieval complete"
        );
        result
    }
}
