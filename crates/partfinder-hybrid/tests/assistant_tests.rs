use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use partfinder_core::error::{Error, Result};
use partfinder_core::traits::{AnswerGenerator, IntentClassifier};
use partfinder_core::types::{CombinedResult, DirectMatch, ManualEntry};
use partfinder_core::Intent;
use partfinder_hybrid::{
    Assistant, IntentRouter, RetrievalService, SemanticSearchClient, GENERATION_FAILED_MESSAGE,
    OUT_OF_SCOPE_MESSAGE,
};
use partfinder_index::StructuredIndex;

enum Classify {
    Label(&'static str),
    Fail,
}

struct StubClassifier(Classify);

#[async_trait]
impl IntentClassifier for StubClassifier {
    async fn classify(&self, _query: &str) -> Result<Intent> {
        match self.0 {
            Classify::Label(label) => Ok(Intent::from_label(label)),
            Classify::Fail => Err(Error::Backend("classifier unavailable".into())),
        }
    }
}

enum Generate {
    Summary,
    Fail,
    Hang,
}

struct StubGenerator {
    mode: Generate,
    calls: Arc<AtomicUsize>,
}

impl StubGenerator {
    fn new(mode: Generate) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { mode, calls: Arc::clone(&calls) }, calls)
    }
}

#[async_trait]
impl AnswerGenerator for StubGenerator {
    async fn generate(&self, intent: Intent, _query: &str, retrieved: &CombinedResult) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            Generate::Summary => Ok(format!("{intent}: {} direct", retrieved.direct_matches().len())),
            Generate::Fail => Err(Error::Backend("model overloaded".into())),
            Generate::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("too late".into())
            }
        }
    }
}

fn router() -> IntentRouter {
    let manuals = HashMap::from([(
        "PS11752991".to_string(),
        ManualEntry {
            title: "Door Shelf Bin".into(),
            installation_text: "Tilt the bin up and lift it off the door liner.".into(),
            url: "https://www.partselect.com/PS11752991.htm".into(),
        },
    )]);
    let index = StructuredIndex::from_maps(HashMap::new(), HashMap::new(), manuals);
    IntentRouter::new(Arc::new(RetrievalService::new(Arc::new(index), SemanticSearchClient::disabled())))
}

fn assistant(classify: Classify, generate: Generate) -> (Assistant<StubClassifier, StubGenerator>, Arc<AtomicUsize>) {
    let (generator, calls) = StubGenerator::new(generate);
    (
        Assistant::new(StubClassifier(classify), generator, router(), Duration::from_millis(100)),
        calls,
    )
}

#[tokio::test]
async fn in_scope_query_is_answered_from_retrieval() {
    let (assistant, calls) = assistant(Classify::Label("installation"), Generate::Summary);
    let reply = assistant.handle("How do I install PS11752991?").await;

    assert_eq!(reply.intent, Intent::Installation);
    assert_eq!(reply.response, "installation: 1 direct");
    let retrieved = reply.retrieved.expect("retrieval result");
    assert!(matches!(retrieved.direct_matches()[0], DirectMatch::InstallationManual { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn out_of_scope_skips_generation() {
    let (assistant, calls) = assistant(Classify::Label("out_of_scope"), Generate::Summary);
    let reply = assistant.handle("what's the weather").await;
    assert!(reply.is_out_of_scope());
    assert_eq!(reply.response, OUT_OF_SCOPE_MESSAGE);
    assert!(reply.retrieved.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_label_is_out_of_scope() {
    let (assistant, calls) = assistant(Classify::Label("recipes"), Generate::Summary);
    let reply = assistant.handle("best lasagna").await;
    assert!(reply.is_out_of_scope());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn classifier_failure_falls_back_to_out_of_scope() {
    let (assistant, calls) = assistant(Classify::Fail, Generate::Summary);
    assert_eq!(assistant.classify("PS11752991").await, Intent::OutOfScope);
    let reply = assistant.handle("PS11752991").await;
    assert!(reply.is_out_of_scope());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generator_error_gives_apology() {
    let (assistant, _) = assistant(Classify::Label("troubleshoot"), Generate::Fail);
    let reply = assistant.handle("ice maker not working").await;
    assert_eq!(reply.intent, Intent::Troubleshoot);
    assert_eq!(reply.response, GENERATION_FAILED_MESSAGE);
    assert!(reply.retrieved.is_some());
}

#[tokio::test]
async fn generator_timeout_gives_apology() {
    let (assistant, calls) = assistant(Classify::Label("qna"), Generate::Hang);
    let reply = tokio::time::timeout(Duration::from_secs(5), assistant.handle("what is a door bin"))
        .await
        .expect("handle must respect the generation timeout");
    assert_eq!(reply.response, GENERATION_FAILED_MESSAGE);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn slow_generation_reports_timeout_error() {
    let (assistant, _) = assistant(Classify::Label("qna"), Generate::Hang);
    let err = assistant
        .generate(Intent::Qna, "what is a door bin", &CombinedResult::empty("what is a door bin"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { after_ms: 100 }));
    assert!(!err.is_fatal());
}
