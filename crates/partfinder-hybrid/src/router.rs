//! Intent Router: a fixed table from intent to pipeline, with
//! `out_of_scope` short-circuiting before any retrieval.

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use partfinder_core::types::CombinedResult;
use partfinder_core::Intent;

use crate::service::{RetrievalService, RetrieveOptions};

pub const OUT_OF_SCOPE_MESSAGE: &str = "Sorry, I am a bot only for helping on partselect.com specifically with dishwasher and refrigerator parts. I can help you with compatibility, installation, troubleshooting, or general questions about dishwashers and refridgerators on this page.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutOfScopeResponse {
    pub message: &'static str,
}

impl Default for OutOfScopeResponse {
    fn default() -> Self {
        Self { message: OUT_OF_SCOPE_MESSAGE }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    Retrieved { intent: Intent, result: CombinedResult },
    OutOfScope(OutOfScopeResponse),
}

impl RouteOutcome {
    pub fn intent(&self) -> Intent {
        match self {
            RouteOutcome::Retrieved { intent, .. } => *intent,
            RouteOutcome::OutOfScope(_) => Intent::OutOfScope,
        }
    }

    pub fn result(&self) -> Option<&CombinedResult> {
        match self {
            RouteOutcome::Retrieved { result, .. } => Some(result),
            RouteOutcome::OutOfScope(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct IntentRouter {
    service: Arc<RetrievalService>,
}

impl IntentRouter {
    pub fn new(service: Arc<RetrievalService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &RetrievalService {
        &self.service
    }

    pub async fn route(&self, intent: Intent, query: &str) -> RouteOutcome {
        self.route_with(intent, query, RetrieveOptions::default()).await
    }

    pub async fn route_with(&self, intent: Intent, query: &str, opts: RetrieveOptions) -> RouteOutcome {
        if intent == Intent::OutOfScope {
            debug!("out of scope, skipping retrieval");
            return RouteOutcome::OutOfScope(OutOfScopeResponse::default());
        }
        let result = self.service.retrieve_with(intent, query, opts).await;
        RouteOutcome::Retrieved { intent, result }
    }

    /// Route a raw classifier label. Unknown labels are out of scope.
    pub async fn route_label(&self, label: &str, query: &str) -> RouteOutcome {
        self.route(Intent::from_label(label), query).await
    }
}
