//! Filtered nearest-neighbour queries against the document table.

use anyhow::{anyhow, Context};
use arrow_array::{Array, Float32Array, RecordBatch, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Connection;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use partfinder_core::error::{Error, Result};
use partfinder_core::traits::{Embedder, SemanticBackend};
use partfinder_core::types::{Metadata, QueryResponse, SemanticFilter};

use crate::corpus::{merge_metadata, METADATA_COLUMNS};
use crate::table::{open_db, table_exists};

pub struct LanceSemanticBackend {
    db: Connection,
    table_name: String,
    embedder: Arc<dyn Embedder>,
}

impl LanceSemanticBackend {
    /// Open the store at `dir`. The table must already exist; a store that
    /// was never ingested is a startup error.
    pub async fn open(dir: &Path, table_name: &str, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let db = open_db(&dir.to_string_lossy())
            .await
            .map_err(|e| Error::Backend(format!("open {}: {e:#}", dir.display())))?;
        if !table_exists(&db, table_name).await? {
            return Err(Error::InvalidConfig(format!(
                "table '{table_name}' not found in {}; run the indexer first",
                dir.display()
            )));
        }
        Ok(Self { db, table_name: table_name.to_string(), embedder })
    }

    async fn query_one(&self, text: &str, predicate: &str, k: usize) -> anyhow::Result<Hits> {
        let embedder = Arc::clone(&self.embedder);
        let owned = vec![text.to_string()];
        let mut vectors = tokio::task::spawn_blocking(move || embedder.embed_batch(&owned)).await??;
        let query_vec = vectors.pop().ok_or_else(|| anyhow!("embedder returned no vector"))?;

        let table = self
            .db
            .open_table(&self.table_name)
            .execute()
            .await
            .with_context(|| format!("open table {}", self.table_name))?;
        let mut stream = table
            .vector_search(query_vec)?
            .only_if(predicate)
            .limit(k)
            .execute()
            .await?;

        let mut hits = Hits::default();
        while let Some(batch) = stream.try_next().await? {
            hits.extend_from(&batch)?;
        }
        hits.sort_by_distance();
        hits.truncate(k);
        debug!(predicate, hits = hits.ids.len(), "lance query");
        Ok(hits)
    }
}

#[async_trait]
impl SemanticBackend for LanceSemanticBackend {
    async fn query(&self, texts: &[String], filter: &SemanticFilter, k: usize) -> Result<QueryResponse> {
        let predicate = filter_predicate(filter);
        let mut response = QueryResponse::default();
        for text in texts {
            let hits = self.query_one(text, &predicate, k).await.map_err(Error::from)?;
            response.ids.push(hits.ids);
            response.documents.push(hits.documents);
            response.metadatas.push(hits.metadatas);
            response.distances.push(hits.distances);
        }
        Ok(response)
    }
}

/// SQL predicate for a filter: `source = '..' [AND appliance = '..']`.
pub fn filter_predicate(filter: &SemanticFilter) -> String {
    let mut predicate = format!("source = '{}'", escape(filter.source.as_str()));
    if let Some(appliance) = filter.appliance {
        predicate.push_str(&format!(" AND appliance = '{}'", escape(appliance.as_str())));
    }
    predicate
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

#[derive(Default)]
struct Hits {
    ids: Vec<String>,
    documents: Vec<String>,
    metadatas: Vec<Metadata>,
    distances: Vec<f32>,
}

impl Hits {
    fn extend_from(&mut self, batch: &RecordBatch) -> anyhow::Result<()> {
        let ids = string_col(batch, "id")?;
        let content = string_col(batch, "content")?;
        let extra_col = string_col(batch, "extra")?;
        let meta_cols = METADATA_COLUMNS
            .iter()
            .map(|name| Ok((*name, string_col(batch, name)?)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let distance = batch
            .column_by_name("_distance")
            .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
            .ok_or_else(|| anyhow!("_distance column missing"))?;

        for i in 0..batch.num_rows() {
            let extra = match serde_json::from_str::<Value>(extra_col.value(i)) {
                Ok(Value::Object(map)) => map,
                _ => Metadata::new(),
            };
            let meta = merge_metadata(meta_cols.iter().map(|(name, col)| (*name, col.value(i))), extra);
            self.ids.push(ids.value(i).to_string());
            self.documents.push(content.value(i).to_string());
            self.metadatas.push(meta);
            self.distances.push(if distance.is_null(i) { f32::MAX } else { distance.value(i) });
        }
        Ok(())
    }

    fn sort_by_distance(&mut self) {
        let mut order: Vec<usize> = (0..self.ids.len()).collect();
        order.sort_by(|&a, &b| self.distances[a].total_cmp(&self.distances[b]));
        self.ids = order.iter().map(|&i| std::mem::take(&mut self.ids[i])).collect();
        self.documents = order.iter().map(|&i| std::mem::take(&mut self.documents[i])).collect();
        self.metadatas = order.iter().map(|&i| std::mem::take(&mut self.metadatas[i])).collect();
        self.distances = order.iter().map(|&i| self.distances[i]).collect();
    }

    fn truncate(&mut self, k: usize) {
        self.ids.truncate(k);
        self.documents.truncate(k);
        self.metadatas.truncate(k);
        self.distances.truncate(k);
    }
}

fn string_col<'a>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow!("{name} column missing"))
}
