//! Text embedders backing the semantic search table.

mod bge;
mod device;
mod hash;
mod pool;
mod tokenize;

use std::path::{Path, PathBuf};
use tracing::info;

use partfinder_core::config::{expand_path, EmbedSettings};
use partfinder_core::error::{Error, Result};
use partfinder_core::traits::Embedder;

pub use bge::{BgeM3Embedder, BGE_M3_DIM};
pub use device::select_device;
pub use hash::HashEmbedder;
pub use pool::masked_mean_l2;
pub use tokenize::tokenize_on_device;

/// `APP_USE_FAKE_EMBEDDINGS=1` forces the hash embedder regardless of config.
pub fn fake_requested_by_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Pick the embedder for this process. A missing model directory is a
/// startup failure unless fake embeddings were requested.
pub fn load_embedder(settings: &EmbedSettings) -> Result<Box<dyn Embedder>> {
    if settings.use_fake || fake_requested_by_env() {
        info!(dim = BGE_M3_DIM, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(BGE_M3_DIM)));
    }
    let dir = resolve_model_dir(settings.model_dir.as_deref())?;
    let model = BgeM3Embedder::load(&dir).map_err(|e| Error::MissingCredential(format!("{e:#}")))?;
    Ok(Box::new(model))
}

fn resolve_model_dir(configured: Option<&str>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        let p = expand_path(dir);
        if p.exists() {
            return Ok(p);
        }
        return Err(Error::MissingCredential(format!("embed.model_dir {} does not exist", p.display())));
    }
    let fallback = Path::new("models/bge-m3");
    if fallback.exists() {
        return Ok(fallback.to_path_buf());
    }
    Err(Error::MissingCredential(
        "no BGE-M3 model directory; set embed.model_dir or APP_EMBED__MODEL_DIR".into(),
    ))
}
