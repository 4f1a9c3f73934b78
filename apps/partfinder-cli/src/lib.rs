//! Startup wiring shared by the `partfinder` and `partfinder-indexer`
//! binaries. Everything here runs once at process start.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use partfinder_core::config::{resolve_with_base, Config, Settings};
use partfinder_core::traits::{Embedder, SemanticBackend};
use partfinder_hybrid::RetrievalService;
use partfinder_index::{IndexPaths, StructuredIndex};
use partfinder_vector::LanceSemanticBackend;

/// Console logging to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

pub fn load_config() -> Result<Config> {
    Config::load().context("loading configuration")
}

pub fn load_index(base: &Path, settings: &Settings) -> Result<Arc<StructuredIndex>> {
    let paths = IndexPaths::from_settings(base, &settings.data);
    let index = StructuredIndex::load(&paths)?;
    Ok(Arc::new(index))
}

pub fn load_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let embedder = partfinder_embed::load_embedder(&settings.embed)?;
    Ok(Arc::from(embedder))
}

/// Index plus, when enabled, the LanceDB backend. `semantic = false` or
/// `retrieval.semantic_enabled = false` skips the embedder and the store.
pub async fn build_service(base: &Path, settings: &Settings, semantic: bool) -> Result<RetrievalService> {
    let index = load_index(base, settings)?;
    let backend = if semantic && settings.retrieval.semantic_enabled {
        let dir = resolve_with_base(base, &settings.data.lancedb_dir);
        let opened = LanceSemanticBackend::open(&dir, &settings.data.table, load_embedder(settings)?).await;
        let backend = semantic_or_degraded(opened)?;
        if backend.is_some() {
            info!(dir = %dir.display(), table = %settings.data.table, "semantic backend ready");
        }
        backend
    } else {
        info!("semantic search disabled");
        None
    };
    Ok(RetrievalService::from_settings(index, backend, &settings.retrieval))
}

/// Fatal open errors abort startup. Anything else leaves semantic search
/// off so the structured pipelines keep serving.
pub fn semantic_or_degraded<B>(opened: partfinder_core::Result<B>) -> Result<Option<Arc<dyn SemanticBackend>>>
where
    B: SemanticBackend + 'static,
{
    match opened {
        Ok(backend) => Ok(Some(Arc::new(backend) as Arc<dyn SemanticBackend>)),
        Err(err) if err.is_fatal() => Err(err.into()),
        Err(err) => {
            warn!(target: "partfinder::semantic", error = %err, "semantic backend unavailable; serving structured lookups only");
            Ok(None)
        }
    }
}

/// True when the error chain carries a fatal startup error.
pub fn is_fatal(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<partfinder_core::Error>())
        .any(partfinder_core::Error::is_fatal)
}
