use anyhow::{ensure, Result};
use arrow_array::types::Float32Type;
use arrow_array::{ArrayRef, FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use lancedb::Connection;
use std::sync::Arc;
use tracing::info;

use partfinder_core::traits::Embedder;

use crate::corpus::CorpusDocument;
use crate::schema::build_docs_schema;
use crate::table::ensure_table;

const BATCH_SIZE: usize = 128;

/// Embeds corpus documents and appends them to the document table.
pub struct CorpusWriter {
    db: Connection,
    table_name: String,
    embedder: Arc<dyn Embedder>,
}

impl CorpusWriter {
    pub fn new(db: Connection, table_name: &str, embedder: Arc<dyn Embedder>) -> Self {
        Self { db, table_name: table_name.to_string(), embedder }
    }

    /// Returns the number of rows written.
    pub async fn ingest(&self, docs: &[CorpusDocument], show_progress: bool) -> Result<usize> {
        if docs.is_empty() {
            info!(table = %self.table_name, "nothing to ingest");
            return Ok(0);
        }
        info!(docs = docs.len(), table = %self.table_name, "ingesting corpus");

        let pb = if show_progress { ProgressBar::new(docs.len() as u64) } else { ProgressBar::hidden() };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}")?
                .progress_chars("#>-"),
        );

        let dim = i32::try_from(self.embedder.dim())?;
        ensure_table(&self.db, &self.table_name, build_docs_schema(dim)).await?;

        let mut written = 0usize;
        for chunk in docs.chunks(BATCH_SIZE) {
            let texts: Vec<String> = chunk.iter().map(|d| d.content.clone()).collect();
            let embedder = Arc::clone(&self.embedder);
            let vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&texts)).await??;
            ensure!(vectors.len() == chunk.len(), "embedder returned {} vectors for {} docs", vectors.len(), chunk.len());

            self.insert_batch(chunk, vectors, dim).await?;
            written += chunk.len();
            pb.set_position(written as u64);
            pb.set_message(format!("batch of {}", chunk.len()));
        }
        pb.finish_with_message("done");
        info!(written, table = %self.table_name, "corpus ingested");
        Ok(written)
    }

    async fn insert_batch(&self, docs: &[CorpusDocument], vectors: Vec<Vec<f32>>, dim: i32) -> Result<()> {
        let batch = docs_record_batch(docs, vectors, dim)?;
        let schema = batch.schema();
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        self.db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
        Ok(())
    }
}

/// One table row per document, in `build_docs_schema` column order.
pub(crate) fn docs_record_batch(docs: &[CorpusDocument], vectors: Vec<Vec<f32>>, dim: i32) -> Result<RecordBatch> {
    let col = |f: fn(&CorpusDocument) -> String| -> ArrayRef {
        Arc::new(StringArray::from(docs.iter().map(f).collect::<Vec<_>>()))
    };
    let extras = docs
        .iter()
        .map(|d| serde_json::to_string(&d.extra))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let vectors = vectors.into_iter().map(|v| Some(v.into_iter().map(Some).collect::<Vec<_>>()));

    let columns: Vec<ArrayRef> = vec![
        col(|d| d.id.clone()),
        col(|d| d.source.as_str().to_string()),
        col(|d| d.appliance.clone()),
        col(|d| d.part_number.clone()),
        col(|d| d.title.clone()),
        col(|d| d.url.clone()),
        col(|d| d.content.clone()),
        Arc::new(StringArray::from(extras)),
        Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, dim)),
    ];
    Ok(RecordBatch::try_new(build_docs_schema(dim), columns)?)
}
