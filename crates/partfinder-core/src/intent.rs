//! Intent labels and the filters each retrieval pipeline applies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// The five query categories produced by the intent classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Compatibility,
    Installation,
    Troubleshoot,
    Qna,
    OutOfScope,
}

impl Intent {
    pub const ALL: [Intent; 5] = [
        Intent::Compatibility,
        Intent::Installation,
        Intent::Troubleshoot,
        Intent::Qna,
        Intent::OutOfScope,
    ];

    /// Parse a classifier label. Anything outside the fixed set maps to
    /// `OutOfScope`, never to an error.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "compatibility" => Intent::Compatibility,
            "installation" => Intent::Installation,
            "troubleshoot" => Intent::Troubleshoot,
            "qna" => Intent::Qna,
            _ => Intent::OutOfScope,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Compatibility => "compatibility",
            Intent::Installation => "installation",
            Intent::Troubleshoot => "troubleshoot",
            Intent::Qna => "qna",
            Intent::OutOfScope => "out_of_scope",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document partition of the embedded corpus. Stored verbatim in the
/// `source` column of the vector table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFilter {
    Compatibility,
    Installation,
    Troubleshooting,
    General,
}

impl SourceFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFilter::Compatibility => "compatibility",
            SourceFilter::Installation => "installation",
            SourceFilter::Troubleshooting => "troubleshooting",
            SourceFilter::General => "general",
        }
    }
}

impl fmt::Display for SourceFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compatibility" => Ok(SourceFilter::Compatibility),
            "installation" => Ok(SourceFilter::Installation),
            "troubleshooting" => Ok(SourceFilter::Troubleshooting),
            "general" => Ok(SourceFilter::General),
            other => Err(Error::InvalidConfig(format!("unknown document source '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appliance {
    Dishwasher,
    Refrigerator,
}

impl Appliance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Appliance::Dishwasher => "dishwasher",
            Appliance::Refrigerator => "refrigerator",
        }
    }
}

impl fmt::Display for Appliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Appliance {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dishwasher" => Ok(Appliance::Dishwasher),
            "refrigerator" | "fridge" => Ok(Appliance::Refrigerator),
            other => Err(Error::InvalidConfig(format!("unknown appliance '{other}'"))),
        }
    }
}
