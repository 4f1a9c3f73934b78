use serde::Serialize;
use std::fmt;

use partfinder_core::{Intent, SourceFilter};

/// One retrieval pipeline per in-scope intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    Compatibility,
    Installation,
    Troubleshooting,
    General,
}

impl Pipeline {
    /// `None` for `out_of_scope`: no pipeline runs.
    pub fn for_intent(intent: Intent) -> Option<Self> {
        match intent {
            Intent::Compatibility => Some(Pipeline::Compatibility),
            Intent::Installation => Some(Pipeline::Installation),
            Intent::Troubleshoot => Some(Pipeline::Troubleshooting),
            Intent::Qna => Some(Pipeline::General),
            Intent::OutOfScope => None,
        }
    }

    pub fn source(self) -> SourceFilter {
        match self {
            Pipeline::Compatibility => SourceFilter::Compatibility,
            Pipeline::Installation => SourceFilter::Installation,
            Pipeline::Troubleshooting => SourceFilter::Troubleshooting,
            Pipeline::General => SourceFilter::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Pipeline::Compatibility => "compatibility",
            Pipeline::Installation => "installation",
            Pipeline::Troubleshooting => "troubleshooting",
            Pipeline::General => "general",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_in_scope_intent_has_its_own_pipeline() {
        let pipelines: Vec<Pipeline> = Intent::ALL.iter().filter_map(|i| Pipeline::for_intent(*i)).collect();
        assert_eq!(pipelines.len(), 4);
        for (i, a) in pipelines.iter().enumerate() {
            for b in &pipelines[i + 1..] {
                assert_ne!(a, b);
                assert_ne!(a.source(), b.source());
            }
        }
        assert_eq!(Pipeline::for_intent(Intent::OutOfScope), None);
    }
}
