//! Request orchestration: classify, route, generate.

use serde::Serialize;
use std::time::Duration;
use tracing::{error, info, warn};

use partfinder_core::error::{Error, Result};
use partfinder_core::traits::{AnswerGenerator, IntentClassifier};
use partfinder_core::types::CombinedResult;
use partfinder_core::Intent;

use crate::router::{IntentRouter, RouteOutcome, OUT_OF_SCOPE_MESSAGE};

pub const GENERATION_FAILED_MESSAGE: &str =
    "I apologize, but I encountered an error while generating a response. Please try rephrasing your question.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub intent: Intent,
    pub retrieved: Option<CombinedResult>,
}

pub struct Assistant<C, G> {
    classifier: C,
    generator: G,
    router: IntentRouter,
    generation_timeout: Duration,
}

impl<C, G> Assistant<C, G>
where
    C: IntentClassifier,
    G: AnswerGenerator,
{
    pub fn new(classifier: C, generator: G, router: IntentRouter, generation_timeout: Duration) -> Self {
        Self { classifier, generator, router, generation_timeout }
    }

    /// Classifier failures fall back to `out_of_scope`.
    pub async fn classify(&self, query: &str) -> Intent {
        match self.classifier.classify(query).await {
            Ok(intent) => intent,
            Err(err) => {
                warn!(error = %err, "intent classification failed; treating as out of scope");
                Intent::OutOfScope
            }
        }
    }

    /// Run the generator under the configured timeout. Elapsing is
    /// reported as `Error::Timeout`.
    pub async fn generate(&self, intent: Intent, query: &str, result: &CombinedResult) -> Result<String> {
        match tokio::time::timeout(self.generation_timeout, self.generator.generate(intent, query, result)).await {
            Ok(generated) => generated,
            Err(_) => Err(Error::Timeout {
                after_ms: u64::try_from(self.generation_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Answer one user message. Never fails: every error path ends in a
    /// user-facing message.
    pub async fn handle(&self, query: &str) -> ChatReply {
        let intent = self.classify(query).await;
        info!(intent = %intent, "classified query");

        let result = match self.router.route(intent, query).await {
            RouteOutcome::OutOfScope(resp) => {
                return ChatReply { response: resp.message.to_string(), intent, retrieved: None };
            }
            RouteOutcome::Retrieved { result, .. } => result,
        };

        let response = match self.generate(intent, query, &result).await {
            Ok(text) => text,
            Err(err) => {
                error!(intent = %intent, error = %err, "answer generation failed");
                GENERATION_FAILED_MESSAGE.to_string()
            }
        };
        ChatReply { response, intent, retrieved: Some(result) }
    }
}

impl ChatReply {
    pub fn is_out_of_scope(&self) -> bool {
        self.intent == Intent::OutOfScope && self.response == OUT_OF_SCOPE_MESSAGE
    }
}
