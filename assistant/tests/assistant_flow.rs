//! Full conversation flows: model requests actions, the caller applies them
//! to the draft, and searches are resolved against the retrieval system.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use agenda_assistant::{
    ActionCall, AssistantError, Category, ChatProvider, ChatRequest, ChatTurn, DraftEvent,
    ModelReply, Orchestrator, PromptContext,
};
use agenda_embeddings::{
    EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, normalize,
};
use agenda_retrieval::{Indexer, MemoryVectorStore, Retriever};

struct ScriptedProvider {
    script: Mutex<VecDeque<agenda_assistant::Result<ModelReply>>>,
}

impl ScriptedProvider {
    fn new(script: Vec<agenda_assistant::Result<ModelReply>>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, _request: ChatRequest) -> agenda_assistant::Result<ModelReply> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AssistantError::Provider("script exhausted".to_string())))
    }

    fn is_available(&self) -> bool {
        true
    }
}

struct TopicProvider;

fn topic_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut v = vec![0.1, 0.1, 0.1];
    if lower.contains("colesterolo") {
        v[0] += 1.0;
    }
    if lower.contains("bolletta") || lower.contains("gas") {
        v[1] += 1.0;
    }
    normalize(&mut v);
    v
}

#[async_trait]
impl EmbeddingProvider for TopicProvider {
    fn name(&self) -> &str {
        "topic"
    }

    fn default_model(&self) -> &str {
        "topic-model"
    }

    fn default_dimension(&self) -> usize {
        3
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> agenda_embeddings::Result<EmbeddingResponse> {
        Ok(EmbeddingResponse {
            embedding: topic_vector(&request.text),
            model: "topic-model".to_string(),
            dimension: 3,
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

fn context() -> PromptContext {
    let now: DateTime<Utc> = DateTime::parse_from_rfc3339("2026-08-27T10:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    PromptContext::new(now).with_categories(vec![Category {
        id: "cat-casa".to_string(),
        name: "Casa".to_string(),
        icon: None,
    }])
}

/// "Segna la bolletta del gas di 100 euro per il 15": the model fills the
/// form incrementally, and each update only touches the fields it names.
#[tokio::test]
async fn draft_is_filled_incrementally_across_turns() {
    let first = ModelReply {
        text: Some("Segnato: bolletta del gas da 100 euro. Per quale data?".to_string()),
        calls: vec![
            ActionCall::new("update_event_details")
                .with_arg("title", serde_json::json!("Bolletta gas"))
                .with_arg("amount", serde_json::json!(100.0))
                .with_arg("location", serde_json::json!("Casa"))
                .with_arg("category_id", serde_json::json!("cat-casa")),
        ],
    };
    let second = ModelReply {
        text: Some("Fissato per il 15 settembre. Salvo?".to_string()),
        calls: vec![
            ActionCall::new("update_event_details")
                .with_arg("start_datetime", serde_json::json!("2026-09-15T09:00:00")),
        ],
    };

    let provider = Arc::new(ScriptedProvider::new(vec![Ok(first), Ok(second)]));
    let orchestrator = Orchestrator::new(provider);

    let mut draft = DraftEvent::default();
    let mut history = vec![ChatTurn::user("Segna la bolletta del gas di 100 euro")];

    let outcome = orchestrator
        .run_turn(&context().with_draft(draft.clone()), &history)
        .await
        .unwrap();
    assert!(outcome.dropped_fields.is_empty());
    for action in &outcome.actions {
        draft.apply_update(&action.arguments);
    }

    assert_eq!(draft.title.as_deref(), Some("Bolletta gas"));
    assert_eq!(draft.amount, Some(100.0));
    assert_eq!(draft.location.as_deref(), Some("Casa"));
    assert_eq!(draft.missing_required_fields(), vec!["start_datetime"]);

    history.push(ChatTurn::assistant(outcome.reply_text));
    history.push(ChatTurn::user("Il 15 settembre"));

    let outcome = orchestrator
        .run_turn(&context().with_draft(draft.clone()), &history)
        .await
        .unwrap();
    for action in &outcome.actions {
        draft.apply_update(&action.arguments);
    }

    // The second update did not disturb the earlier fields.
    assert_eq!(draft.title.as_deref(), Some("Bolletta gas"));
    assert_eq!(draft.amount, Some(100.0));
    assert_eq!(draft.location.as_deref(), Some("Casa"));
    assert_eq!(draft.category_id.as_deref(), Some("cat-casa"));
    assert!(draft.is_complete());
}

/// A `search_documents` request is resolved inline and never surfaces as an
/// action for the caller.
#[tokio::test]
async fn search_requests_resolve_against_the_index() {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(TopicProvider);
    let store = Arc::new(MemoryVectorStore::new(3));
    let indexer = Indexer::new(embedder.clone(), store.clone());
    let retriever = Arc::new(Retriever::new(embedder, store));

    indexer
        .vectorize_document(
            "doc-analisi",
            "Il referto indica colesterolo 220 mg/dL",
            serde_json::json!({}),
        )
        .await
        .unwrap();
    indexer
        .vectorize_document(
            "doc-bolletta",
            "Bolletta del gas di agosto, 100 euro",
            serde_json::json!({}),
        )
        .await
        .unwrap();

    let reply = ModelReply {
        text: None,
        calls: vec![
            ActionCall::new("search_documents")
                .with_arg("query", serde_json::json!("quanto avevo di colesterolo?")),
        ],
    };
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(reply)]));
    let orchestrator = Orchestrator::new(provider).with_retriever(retriever);

    let outcome = orchestrator
        .run_turn(&context(), &[ChatTurn::user("Quanto avevo di colesterolo?")])
        .await
        .unwrap();

    assert!(outcome.actions.is_empty());
    assert!(!outcome.search_results.is_empty());
    assert_eq!(outcome.search_results[0].source_id, "doc-analisi");
    assert!(outcome.search_results[0].text.contains("220 mg/dL"));
    // The reply itself carries the answer, not just the side channel.
    assert!(outcome.reply_text.contains("220 mg/dL"));
}

/// When the model sends its own text next to a search call, the best
/// snippet is still merged into the reply.
#[tokio::test]
async fn search_snippet_is_merged_into_model_text() {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(TopicProvider);
    let store = Arc::new(MemoryVectorStore::new(3));
    let indexer = Indexer::new(embedder.clone(), store.clone());
    let retriever = Arc::new(Retriever::new(embedder, store));

    indexer
        .vectorize_document(
            "doc-analisi",
            "Il referto indica colesterolo 220 mg/dL",
            serde_json::json!({}),
        )
        .await
        .unwrap();

    let reply = ModelReply {
        text: Some("Cerco nei tuoi documenti.".to_string()),
        calls: vec![
            ActionCall::new("search_documents")
                .with_arg("query", serde_json::json!("valori del colesterolo")),
        ],
    };
    let provider = Arc::new(ScriptedProvider::new(vec![Ok(reply)]));
    let orchestrator = Orchestrator::new(provider).with_retriever(retriever);

    let outcome = orchestrator
        .run_turn(&context(), &[ChatTurn::user("Com'era il colesterolo?")])
        .await
        .unwrap();

    assert!(outcome.reply_text.starts_with("Cerco nei tuoi documenti."));
    assert!(outcome.reply_text.contains("220 mg/dL"));
}
