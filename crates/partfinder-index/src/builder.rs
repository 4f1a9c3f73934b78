//! Offline construction of the map files from scraped records.

use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use partfinder_core::error::{Error, Result};
use partfinder_core::types::ManualEntry;

use crate::index::{IndexPaths, StructuredIndex};

const MIN_MODEL_LEN: usize = 5;
const MIN_INSTALLATION_TEXT: usize = 20;

/// One scraped compatibility row: a part and the models it fits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompatibilityRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub part_number: String,
    #[serde(default, deserialize_with = "strings_only")]
    pub models: Vec<String>,
}

impl CompatibilityRecord {
    pub fn new(part_number: impl Into<String>, models: &[&str]) -> Self {
        Self {
            part_number: part_number.into(),
            models: models.iter().map(|m| (*m).to_string()).collect(),
        }
    }
}

/// One scraped installation guide.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstallationRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub part_number: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
}

/// Accumulates records into sorted, de-duplicated maps.
#[derive(Debug, Default)]
pub struct MapBuilder {
    parts_to_models: BTreeMap<String, BTreeSet<String>>,
    model_to_parts: BTreeMap<String, BTreeSet<String>>,
    manuals: BTreeMap<String, ManualEntry>,
    skipped_installation: usize,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_compatibility(&mut self, record: &CompatibilityRecord) {
        let part = record.part_number.trim().to_uppercase();
        if part.is_empty() {
            return;
        }
        for raw in &record.models {
            let model = normalize_model(raw);
            if !model_looks_valid(&model) {
                continue;
            }
            self.parts_to_models.entry(part.clone()).or_default().insert(model.clone());
            self.model_to_parts.entry(model).or_default().insert(part.clone());
        }
    }

    pub fn add_installation(&mut self, record: &InstallationRecord) {
        let part = record.part_number.trim().to_uppercase();
        let text = record.text.trim();
        if part.is_empty() || text.chars().count() < MIN_INSTALLATION_TEXT {
            self.skipped_installation += 1;
            return;
        }
        self.manuals.insert(
            part,
            ManualEntry {
                title: record.title.trim().to_string(),
                installation_text: text.to_string(),
                url: record.url.trim().to_string(),
            },
        );
    }

    pub fn extend_compatibility<'a>(&mut self, records: impl IntoIterator<Item = &'a CompatibilityRecord>) {
        for r in records {
            self.add_compatibility(r);
        }
    }

    pub fn extend_installation<'a>(&mut self, records: impl IntoIterator<Item = &'a InstallationRecord>) {
        for r in records {
            self.add_installation(r);
        }
    }

    /// Read a JSON array of compatibility records from disk.
    pub fn read_compatibility(path: &Path) -> Result<Vec<CompatibilityRecord>> {
        read_records(path)
    }

    /// Read a JSON array of installation records from disk.
    pub fn read_installation(path: &Path) -> Result<Vec<InstallationRecord>> {
        read_records(path)
    }

    pub fn skipped_installation(&self) -> usize {
        self.skipped_installation
    }

    /// Write the three map files into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> Result<IndexPaths> {
        fs::create_dir_all(dir)
            .map_err(|e| Error::Operation(format!("create {}: {e}", dir.display())))?;
        let paths = IndexPaths::in_dir(dir);

        write_json(&paths.parts_to_models, &self.parts_to_models)?;
        write_json(&paths.model_to_parts, &self.model_to_parts)?;
        write_json(&paths.installation_manual, &self.manuals)?;

        info!(
            parts = self.parts_to_models.len(),
            models = self.model_to_parts.len(),
            manuals = self.manuals.len(),
            skipped = self.skipped_installation,
            dir = %dir.display(),
            "wrote structured maps"
        );
        Ok(paths)
    }

    /// Build the in-memory index without touching disk.
    pub fn build(&self) -> StructuredIndex {
        StructuredIndex::from_maps(
            flatten(&self.parts_to_models),
            flatten(&self.model_to_parts),
            self.manuals.iter().map(|(k, v)| (k.clone(), v.clone())),
        )
    }
}

fn normalize_model(raw: &str) -> String {
    raw.trim().to_uppercase().replace(['\u{2013}', '\u{2014}'], "-")
}

/// Reject scraped noise: a model needs a letter, a digit and some length.
fn model_looks_valid(model: &str) -> bool {
    model.chars().count() >= MIN_MODEL_LEN
        && model.chars().any(|c| c.is_ascii_alphabetic())
        && model.chars().any(|c| c.is_ascii_digit())
}

fn flatten(map: &BTreeMap<String, BTreeSet<String>>) -> impl Iterator<Item = (String, Vec<String>)> + '_ {
    map.iter().map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
}

fn read_records<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let raw = fs::read_to_string(path).map_err(|e| Error::index_load(path, e))?;
    let records: Vec<T> = serde_json::from_str(&raw).map_err(|e| Error::index_load(path, e))?;
    if records.is_empty() {
        warn!(path = %path.display(), "no records in source file");
    }
    Ok(records)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let body = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Operation(format!("serialize {}: {e}", path.display())))?;
    fs::write(path, body).map_err(|e| Error::Operation(format!("write {}: {e}", path.display())))
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

fn strings_only<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    let values = Option::<Vec<serde_json::Value>>::deserialize(d)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_normalization_maps_dashes() {
        assert_eq!(normalize_model(" wdt780saem1\u{2013}a "), "WDT780SAEM1-A");
        assert_eq!(normalize_model("ab\u{2014}12345"), "AB-12345");
    }

    #[test]
    fn model_sanity_check() {
        assert!(model_looks_valid("WDT780SAEM1"));
        assert!(model_looks_valid("2213N414"));
        assert!(!model_looks_valid("A123"));
        assert!(!model_looks_valid("123456"));
        assert!(!model_looks_valid("ABCDEF"));
    }

    #[test]
    fn non_string_models_are_dropped_on_read() {
        let rec: CompatibilityRecord =
            serde_json::from_str(r#"{"part_number": "ps1", "models": ["WDT780SAEM1", 42, null]}"#).unwrap();
        assert_eq!(rec.models, vec!["WDT780SAEM1"]);
    }

    #[test]
    fn null_fields_read_as_empty() {
        let rec: InstallationRecord =
            serde_json::from_str(r#"{"part_number": null, "text": "x"}"#).unwrap();
        assert!(rec.part_number.is_empty());
        assert!(rec.title.is_empty());
    }
}
