//! Semantic Search Client.
//!
//! Wraps the vector store boundary with a timeout and turns every failure
//! into `SemanticOutcome::Degraded`. Callers never see an error from here;
//! the failure is reported on the `partfinder::semantic` log target and in
//! the outcome itself.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use partfinder_core::traits::SemanticBackend;
use partfinder_core::types::{QueryResponse, SemanticFailure, SemanticFilter, SemanticMatch, SemanticOutcome};

#[derive(Clone)]
pub struct SemanticSearchClient {
    backend: Option<Arc<dyn SemanticBackend>>,
    timeout: Duration,
}

impl SemanticSearchClient {
    pub fn new(backend: Arc<dyn SemanticBackend>, timeout: Duration) -> Self {
        Self { backend: Some(backend), timeout }
    }

    /// A client that never queries anything and reports `Disabled`.
    pub fn disabled() -> Self {
        Self { backend: None, timeout: Duration::ZERO }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Up to `k` matches for `query` within `filter`, closest first.
    pub async fn search(&self, query: &str, filter: SemanticFilter, k: usize) -> SemanticOutcome {
        let Some(backend) = &self.backend else {
            return SemanticOutcome::Degraded(SemanticFailure::Disabled);
        };
        if k == 0 {
            return SemanticOutcome::Matches(Vec::new());
        }

        let started = Instant::now();
        let texts = [query.to_string()];
        let outcome = match tokio::time::timeout(self.timeout, backend.query(&texts, &filter, k)).await {
            Ok(Ok(resp)) => match first_row(resp, k) {
                Ok(matches) => SemanticOutcome::Matches(matches),
                Err(reason) => SemanticOutcome::Degraded(SemanticFailure::Malformed(reason)),
            },
            Ok(Err(err)) => SemanticOutcome::Degraded(SemanticFailure::Backend(err.to_string())),
            Err(_) => SemanticOutcome::Degraded(SemanticFailure::Timeout {
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &outcome {
            SemanticOutcome::Matches(m) => {
                debug!(target: "partfinder::semantic", source = %filter.source, hits = m.len(), elapsed_ms, "semantic search");
            }
            SemanticOutcome::Degraded(failure) => {
                warn!(target: "partfinder::semantic", source = %filter.source, elapsed_ms, %failure, "semantic search degraded");
            }
        }
        outcome
    }
}

/// Convert the first row of a column-major response into matches sorted
/// by ascending distance.
fn first_row(resp: QueryResponse, k: usize) -> Result<Vec<SemanticMatch>, String> {
    let QueryResponse { ids, documents, metadatas, distances } = resp;
    let (Some(ids), Some(documents), Some(metadatas), Some(distances)) = (
        ids.into_iter().next(),
        documents.into_iter().next(),
        metadatas.into_iter().next(),
        distances.into_iter().next(),
    ) else {
        return Err("response has no row for the query".to_string());
    };
    let n = documents.len();
    if metadatas.len() != n || distances.len() != n || (!ids.is_empty() && ids.len() != n) {
        return Err(format!(
            "column lengths differ: ids={} documents={n} metadatas={} distances={}",
            ids.len(),
            metadatas.len(),
            distances.len()
        ));
    }
    if distances.iter().any(|d| d.is_nan()) {
        return Err("distance is NaN".to_string());
    }

    let mut ids = ids.into_iter();
    let mut matches: Vec<SemanticMatch> = documents
        .into_iter()
        .zip(metadatas)
        .zip(distances)
        .enumerate()
        .map(|(i, ((text, metadata), distance))| SemanticMatch {
            document_id: ids.next().unwrap_or_else(|| format!("doc-{i}")),
            text,
            metadata,
            distance,
        })
        .collect();
    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    matches.truncate(k);
    Ok(matches)
}
