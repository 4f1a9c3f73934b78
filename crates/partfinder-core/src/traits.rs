use async_trait::async_trait;

use crate::error::Result;
use crate::intent::Intent;
use crate::types::{CombinedResult, QueryResponse, SemanticFilter};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Vector store that answers metadata-filtered nearest-neighbour queries.
///
/// Implementations return one row per query text in every column of the
/// response, ordered by ascending distance.
#[async_trait]
pub trait SemanticBackend: Send + Sync {
    async fn query(&self, texts: &[String], filter: &SemanticFilter, k: usize) -> Result<QueryResponse>;
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, query: &str) -> Result<Intent>;
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, intent: Intent, query: &str, context: &CombinedResult) -> Result<String>;
}
