//! Scraped records normalized into embeddable documents.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use partfinder_core::types::Metadata;
use partfinder_core::SourceFilter;

const MAX_MODELS_IN_METADATA: usize = 100;

/// Table columns copied into every hit's metadata, ahead of the `extra` keys.
pub const METADATA_COLUMNS: [&str; 5] = ["source", "appliance", "part_number", "title", "url"];

/// Sources ingested from a data directory, with their file names.
pub const CORPUS_FILES: [(SourceFilter, &str); 4] = [
    (SourceFilter::Installation, "installation.json"),
    (SourceFilter::Compatibility, "compatibility.json"),
    (SourceFilter::Troubleshooting, "troubleshooting.json"),
    (SourceFilter::General, "parts.json"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct CorpusDocument {
    pub id: String,
    pub source: SourceFilter,
    pub appliance: String,
    pub part_number: String,
    pub title: String,
    pub url: String,
    pub content: String,
    pub extra: Metadata,
}

impl CorpusDocument {
    /// Normalize one scraped record. Records without text yield `None`.
    pub fn from_record(source: SourceFilter, raw: &Value) -> Option<Self> {
        if source == SourceFilter::General {
            return Self::from_catalog_record(raw);
        }
        let content = str_field(raw, "text").trim().to_string();
        if content.is_empty() {
            return None;
        }
        let part_number = str_field(raw, "part_number");
        let title = str_field(raw, "title");
        let id = match raw.get("id").and_then(Value::as_str).filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let key = if part_number.is_empty() { &title } else { &part_number };
                format!("{source}-{key}")
            }
        };
        let url = str_field(raw, "url").split('?').next().unwrap_or_default().to_string();

        Some(Self {
            id,
            source,
            appliance: str_field(raw, "appliance"),
            part_number,
            title,
            url,
            content,
            extra: enrichments(source, raw),
        })
    }

    /// Product catalog rows (`part_id`, `title`, `description`, `brand`)
    /// answer general questions. Rows without a part id are dropped.
    pub fn from_catalog_record(raw: &Value) -> Option<Self> {
        let part_id = str_field(raw, "part_id").trim().to_string();
        if part_id.is_empty() {
            return None;
        }
        let title = str_field(raw, "title");
        let brand = str_field(raw, "brand");
        let content = format!(
            "{title} - {} | brand: {brand} | part_id: {part_id}",
            str_field(raw, "description")
        );

        let mut extra = Metadata::new();
        extra.insert("brand".into(), brand.into());
        for key in ["price", "availability", "manufacturer_part_number"] {
            if raw.get(key).is_some() {
                extra.insert(key.into(), str_field(raw, key).into());
            }
        }

        Some(Self {
            id: part_id.clone(),
            source: SourceFilter::General,
            appliance: str_field(raw, "appliance"),
            part_number: part_id,
            title,
            url: str_field(raw, "url").split('?').next().unwrap_or_default().to_string(),
            content,
            extra,
        })
    }

    /// Flattened metadata as returned with a search hit.
    pub fn metadata(&self) -> Metadata {
        merge_metadata(
            METADATA_COLUMNS.iter().map(|name| (*name, self.column(name))),
            self.extra.clone(),
        )
    }

    /// Stored value of a string column.
    pub fn column(&self, name: &str) -> &str {
        match name {
            "id" => &self.id,
            "source" => self.source.as_str(),
            "appliance" => &self.appliance,
            "part_number" => &self.part_number,
            "title" => &self.title,
            "url" => &self.url,
            "content" => &self.content,
            _ => "",
        }
    }
}

/// Column values first, then `extra`; an `extra` key shadows a column.
pub fn merge_metadata<'a>(columns: impl IntoIterator<Item = (&'a str, &'a str)>, extra: Metadata) -> Metadata {
    let mut meta: Metadata = columns
        .into_iter()
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect();
    meta.extend(extra);
    meta
}

fn enrichments(source: SourceFilter, raw: &Value) -> Metadata {
    let mut extra = Metadata::new();
    match source {
        SourceFilter::Installation => {
            extra.insert("difficulty".into(), str_field(raw, "difficulty").into());
            extra.insert("time_required".into(), str_field(raw, "time_required").into());
            extra.insert("tools".into(), joined(raw.get("tools"), usize::MAX).into());
        }
        SourceFilter::Compatibility => {
            extra.insert("models".into(), joined(raw.get("models"), MAX_MODELS_IN_METADATA).into());
            extra.insert("brands".into(), joined(raw.get("brands"), usize::MAX).into());
            extra.insert("notes".into(), str_field(raw, "notes").into());
        }
        SourceFilter::Troubleshooting => {
            let names: Vec<&str> = raw
                .get("common_parts")
                .and_then(Value::as_array)
                .map(|parts| parts.iter().filter_map(|p| p.get("part_name")?.as_str()).collect())
                .unwrap_or_default();
            extra.insert("symptom".into(), str_field(raw, "symptom").into());
            extra.insert("common_parts".into(), names.join(", ").into());
        }
        SourceFilter::General => {}
    }
    extra
}

fn str_field(raw: &Value, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Comma-join a list field, or stringify a scalar.
fn joined(value: Option<&Value>, limit: usize) -> String {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .take(limit)
            .map(|v| v.as_str().map_or_else(|| v.to_string(), str::to_string))
            .collect::<Vec<_>>()
            .join(", "),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Load every corpus file under `dir`. Missing files are skipped with a
/// warning; duplicate ids keep their first record.
pub fn load_corpus(dir: &Path) -> Result<Vec<CorpusDocument>> {
    let mut seen = HashSet::new();
    let mut docs = Vec::new();
    for (source, file) in CORPUS_FILES {
        let path = dir.join(file);
        if !path.exists() {
            warn!(path = %path.display(), "corpus file missing");
            continue;
        }
        let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let rows: Vec<Value> =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        let total = rows.len();
        let mut kept = 0usize;
        for row in &rows {
            let Some(doc) = CorpusDocument::from_record(source, row) else { continue };
            if seen.insert(doc.id.clone()) {
                docs.push(doc);
                kept += 1;
            }
        }
        info!(source = %source, total, kept, "loaded corpus file");
    }
    Ok(docs)
}
