use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use partfinder_core::config::{resolve_with_base, DataSettings};
use partfinder_core::error::{Error, Result};
use partfinder_core::types::{ManualEntry, ModelNumber, PartNumber};

pub const PARTS_TO_MODELS_FILE: &str = "parts_to_models.json";
pub const MODEL_TO_PARTS_FILE: &str = "model_to_parts.json";
pub const INSTALLATION_MANUAL_FILE: &str = "installation_manual.json";

/// Locations of the three map files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub parts_to_models: PathBuf,
    pub model_to_parts: PathBuf,
    pub installation_manual: PathBuf,
}

impl IndexPaths {
    /// The standard file names inside one directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            parts_to_models: dir.join(PARTS_TO_MODELS_FILE),
            model_to_parts: dir.join(MODEL_TO_PARTS_FILE),
            installation_manual: dir.join(INSTALLATION_MANUAL_FILE),
        }
    }

    pub fn from_settings(base: &Path, data: &DataSettings) -> Self {
        Self {
            parts_to_models: resolve_with_base(base, &data.parts_to_models),
            model_to_parts: resolve_with_base(base, &data.model_to_parts),
            installation_manual: resolve_with_base(base, &data.installation_manual),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub parts: usize,
    pub models: usize,
    pub manuals: usize,
}

/// Immutable exact-match tables. Shared across requests behind an `Arc`;
/// nothing mutates it after construction.
#[derive(Debug, Default)]
pub struct StructuredIndex {
    part_to_models: HashMap<PartNumber, Related>,
    model_to_parts: HashMap<ModelNumber, Related>,
    manuals: HashMap<PartNumber, ManualEntry>,
}

impl StructuredIndex {
    /// Load all three map files. Any missing or malformed file fails the
    /// whole load; there is no partial index.
    pub fn load(paths: &IndexPaths) -> Result<Self> {
        let part_to_models: HashMap<String, Vec<String>> = read_json(&paths.parts_to_models)?;
        let model_to_parts: HashMap<String, Vec<String>> = read_json(&paths.model_to_parts)?;
        let manuals: HashMap<String, ManualEntry> = read_json(&paths.installation_manual)?;

        let index = Self::from_maps(part_to_models, model_to_parts, manuals);
        let stats = index.stats();
        info!(
            parts = stats.parts,
            models = stats.models,
            manuals = stats.manuals,
            "structured index loaded"
        );
        Ok(index)
    }

    /// Build from in-memory maps, normalizing keys and values to upper case.
    pub fn from_maps<P, M, E>(part_to_models: P, model_to_parts: M, manuals: E) -> Self
    where
        P: IntoIterator<Item = (String, Vec<String>)>,
        M: IntoIterator<Item = (String, Vec<String>)>,
        E: IntoIterator<Item = (String, ManualEntry)>,
    {
        Self {
            part_to_models: normalize_multimap(part_to_models),
            model_to_parts: normalize_multimap(model_to_parts),
            manuals: manuals
                .into_iter()
                .map(|(k, v)| (normalize(&k), v))
                .collect(),
        }
    }

    /// Models compatible with `part`, empty when the part is unknown.
    pub fn lookup_part(&self, part: &str) -> &[ModelNumber] {
        self.part_to_models
            .get(&normalize(part))
            .map(Related::as_slice)
            .unwrap_or_default()
    }

    /// Parts that fit `model`, empty when the model is unknown.
    pub fn lookup_model(&self, model: &str) -> &[PartNumber] {
        self.model_to_parts
            .get(&normalize(model))
            .map(Related::as_slice)
            .unwrap_or_default()
    }

    /// Whether `model` is listed for `part`. Constant time.
    pub fn is_compatible(&self, part: &str, model: &str) -> bool {
        self.part_to_models
            .get(&normalize(part))
            .is_some_and(|related| related.contains(&normalize(model)))
    }

    pub fn lookup_manual(&self, part: &str) -> Option<&ManualEntry> {
        self.manuals.get(&normalize(part))
    }

    pub fn knows_part(&self, part: &str) -> bool {
        self.part_to_models.contains_key(&normalize(part))
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            parts: self.part_to_models.len(),
            models: self.model_to_parts.len(),
            manuals: self.manuals.len(),
        }
    }
}

fn normalize(id: &str) -> String {
    id.trim().to_uppercase()
}

/// Related identifiers in first-seen order, with a set for membership.
#[derive(Debug, Default)]
struct Related {
    ordered: Vec<String>,
    members: HashSet<String>,
}

impl Related {
    fn push(&mut self, id: String) {
        if !id.is_empty() && self.members.insert(id.clone()) {
            self.ordered.push(id);
        }
    }

    fn as_slice(&self) -> &[String] {
        &self.ordered
    }

    fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }
}

fn normalize_multimap<I>(entries: I) -> HashMap<String, Related>
where
    I: IntoIterator<Item = (String, Vec<String>)>,
{
    let mut out: HashMap<String, Related> = HashMap::new();
    for (key, values) in entries {
        let slot = out.entry(normalize(&key)).or_default();
        for v in values {
            slot.push(normalize(&v));
        }
    }
    out
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "reading map file");
    let raw = fs::read_to_string(path).map_err(|e| Error::index_load(path, e))?;
    serde_json::from_str(&raw).map_err(|e| Error::index_load(path, e))
}
