//! partfinder-core
//!
//! Shared vocabulary for the parts assistant: the domain types flowing through
//! retrieval, the error taxonomy, the traits at the external boundaries
//! (vector store, embedder, intent classifier, answer generator), layered
//! configuration and the identifier extractor.

pub mod config;
pub mod error;
pub mod extract;
pub mod intent;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use extract::{extract, IdentifierExtractor, ModelRule};
pub use intent::{Appliance, Intent, SourceFilter};
