//! partfinder-index
//!
//! The Structured Index: exact-match part/model/manual tables loaded once at
//! startup, plus the offline builder that produces the map files.

pub mod builder;
pub mod index;

pub use builder::{CompatibilityRecord, InstallationRecord, MapBuilder};
pub use index::{IndexPaths, IndexStats, StructuredIndex};
