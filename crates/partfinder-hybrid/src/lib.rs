//! partfinder-hybrid
//!
//! Hybrid retrieval: structured index lookups and semantic search run
//! concurrently per request and are fused into one `CombinedResult`. The
//! intent router picks the pipeline; the assistant wraps classification,
//! retrieval and answer generation.

pub mod assistant;
pub mod fusion;
pub mod pipeline;
pub mod router;
pub mod semantic;
pub mod service;

pub use assistant::{Assistant, ChatReply, GENERATION_FAILED_MESSAGE};
pub use fusion::{cross_checks, direct_lookup, fuse};
pub use pipeline::Pipeline;
pub use router::{IntentRouter, OutOfScopeResponse, RouteOutcome, OUT_OF_SCOPE_MESSAGE};
pub use semantic::SemanticSearchClient;
pub use service::{RetrievalService, RetrieveOptions};
