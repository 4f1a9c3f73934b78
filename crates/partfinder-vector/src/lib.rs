//! LanceDB-backed semantic search: the document table schema, corpus ingest
//! and the filtered query backend.

pub mod backend;
pub mod corpus;
pub mod schema;
pub mod table;
pub mod writer;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use partfinder_core::traits::Embedder;

pub use backend::{filter_predicate, LanceSemanticBackend};
pub use corpus::{load_corpus, CorpusDocument};
pub use writer::CorpusWriter;

/// Load the corpus files in `data_dir` and append them to `table` in the
/// store at `lancedb_dir`. Returns the number of documents written.
pub async fn ingest_dir(
    data_dir: &Path,
    lancedb_dir: &Path,
    table: &str,
    embedder: Arc<dyn Embedder>,
    show_progress: bool,
) -> Result<usize> {
    let docs = load_corpus(data_dir)?;
    let db = table::open_db(&lancedb_dir.to_string_lossy()).await?;
    CorpusWriter::new(db, table, embedder).ingest(&docs, show_progress).await
}
