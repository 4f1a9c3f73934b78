//! Layered configuration and path helpers.
//!
//! Figment merges built-in defaults, `config.toml`, `config.<env>.toml` and
//! `APP_*` environment variables (`__` separates nested keys, so
//! `APP_RETRIEVAL__K__GENERAL=8` sets `retrieval.k.general`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::intent::SourceFilter;

pub const DEFAULT_TABLE: &str = "partselect_docs";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub parts_to_models: String,
    pub model_to_parts: String,
    pub installation_manual: String,
    pub lancedb_dir: String,
    pub table: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            parts_to_models: "data/maps/parts_to_models.json".into(),
            model_to_parts: "data/maps/model_to_parts.json".into(),
            installation_manual: "data/maps/installation_manual.json".into(),
            lancedb_dir: "data/lancedb".into(),
            table: DEFAULT_TABLE.into(),
        }
    }
}

/// Result counts requested from the vector store, per document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KSettings {
    pub compatibility: usize,
    pub installation: usize,
    pub troubleshooting: usize,
    pub general: usize,
}

impl Default for KSettings {
    fn default() -> Self {
        Self { compatibility: 3, installation: 3, troubleshooting: 3, general: 5 }
    }
}

impl KSettings {
    pub fn for_source(&self, source: SourceFilter) -> usize {
        match source {
            SourceFilter::Compatibility => self.compatibility,
            SourceFilter::Installation => self.installation,
            SourceFilter::Troubleshooting => self.troubleshooting,
            SourceFilter::General => self.general,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub semantic_timeout_ms: u64,
    pub generation_timeout_ms: u64,
    pub semantic_enabled: bool,
    pub k: KSettings,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            semantic_timeout_ms: 10_000,
            generation_timeout_ms: 30_000,
            semantic_enabled: true,
            k: KSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedSettings {
    pub model_dir: Option<String>,
    pub use_fake: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub retrieval: RetrievalSettings,
    pub embed: EmbedSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.semantic_timeout_ms == 0 {
            return Err(Error::InvalidConfig("retrieval.semantic_timeout_ms must be > 0".into()));
        }
        if r.generation_timeout_ms == 0 {
            return Err(Error::InvalidConfig("retrieval.generation_timeout_ms must be > 0".into()));
        }
        for source in [
            SourceFilter::Compatibility,
            SourceFilter::Installation,
            SourceFilter::Troubleshooting,
            SourceFilter::General,
        ] {
            if r.k.for_source(source) == 0 {
                return Err(Error::InvalidConfig(format!("retrieval.k.{source} must be > 0")));
            }
        }
        if self.data.table.trim().is_empty() {
            return Err(Error::InvalidConfig("data.table must not be empty".into()));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
    settings: Settings,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Self::from_figment(figment)
    }

    /// Build from an already-assembled figment. Defaults are not re-applied.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(Self { figment, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("failed to get '{key}': {e}")))
    }
}

/// Expand a user-provided path string:
/// - leading `~` becomes the home directory
/// - `${VAR}` and `$VAR` are substituted from the environment
///
/// The result is not canonicalized.
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let with_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&with_env);
    PathBuf::from(expanded.as_ref())
}

/// Expand `p` and join it onto `base` unless it is already absolute.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let s = Settings::default();
        s.validate().unwrap();
        assert_eq!(s.retrieval.k.general, 5);
        assert_eq!(s.retrieval.k.for_source(SourceFilter::Troubleshooting), 3);
        assert_eq!(s.data.table, DEFAULT_TABLE);
    }

    #[test]
    fn zero_k_is_rejected() {
        let mut s = Settings::default();
        s.retrieval.k.installation = 0;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("retrieval.k.installation"));
        assert!(err.is_fatal());
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let base = Path::new("/srv/app");
        assert_eq!(resolve_with_base(base, "/data/x.json"), PathBuf::from("/data/x.json"));
        assert_eq!(resolve_with_base(base, "maps/x.json"), PathBuf::from("/srv/app/maps/x.json"));
    }
}
