//! The conversation orchestrator.
//!
//! One turn = assemble context, call the model (with retries), validate
//! whatever the model requested against the declared vocabulary, resolve
//! `search_documents` inline, and hand the remaining actions back to the
//! caller for execution. The orchestrator never mutates the draft or saves
//! events itself.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use agenda_retrieval::{Retriever, SearchMatch, SourceType};

use crate::action::{ActionCall, ActionDecl, ActionName, action_vocabulary};
use crate::context::{ChatTurn, PromptContext, Role, truncate_history};
use crate::error::{AssistantError, Result};
use crate::provider::{ChatProvider, ChatRequest, ModelReply};

/// Orchestrator tuning knobs.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Retries after the first attempt (so `3` means up to 4 calls).
    pub max_retries: u32,

    /// Base delay for rate-limit backoff; doubles on each retry.
    pub backoff_base: Duration,

    /// Fixed delay before retrying other transient failures.
    pub retry_delay: Duration,

    /// Most recent dialogue turns sent to the model.
    pub max_history_turns: usize,

    /// Results requested when resolving `search_documents`.
    pub search_top_k: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: Duration::from_secs(2),
            retry_delay: Duration::from_secs(2),
            max_history_turns: 40,
            search_top_k: 5,
        }
    }
}

/// What one conversation turn produced.
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    /// Reply to show the user. Never empty: synthesized when the model
    /// returned actions without text.
    pub reply_text: String,

    /// Validated actions for the caller to execute, in model order.
    /// `search_documents` never appears here; it is resolved inline.
    pub actions: Vec<ActionCall>,

    /// Arguments or whole calls dropped during validation, as
    /// `action` or `action.field` labels.
    pub dropped_fields: Vec<String>,

    /// Results of any inline `search_documents` resolution.
    pub search_results: Vec<SearchMatch>,
}

/// Runs conversation turns against a chat provider.
pub struct Orchestrator {
    provider: Arc<dyn ChatProvider>,
    retriever: Option<Arc<Retriever>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ChatProvider>) -> Self {
        Self {
            provider,
            retriever: None,
            config: OrchestratorConfig::default(),
        }
    }

    /// Attach the retrieval system so `search_documents` can be resolved.
    pub fn with_retriever(mut self, retriever: Arc<Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one conversation turn.
    ///
    /// `turns` is the full dialogue history, oldest first, ending with the
    /// user message to answer.
    pub async fn run_turn(
        &self,
        context: &PromptContext,
        turns: &[ChatTurn],
    ) -> Result<TurnOutcome> {
        let last = turns
            .last()
            .ok_or_else(|| AssistantError::Validation("empty dialogue history".to_string()))?;
        if last.role != Role::User {
            return Err(AssistantError::Validation(
                "last turn must be a user message".to_string(),
            ));
        }
        if last.text.trim().is_empty() {
            return Err(AssistantError::Validation(
                "empty user message".to_string(),
            ));
        }

        let declarations = action_vocabulary(&context.allowed_values());
        let request = ChatRequest {
            turns: truncate_history(turns, self.config.max_history_turns).to_vec(),
            system_instruction: context.system_instruction(),
            declarations: declarations.clone(),
        };

        let reply = self.call_with_retry(request).await?;

        let mut dropped_fields = Vec::new();
        let validated = validate_actions(reply.calls, &declarations, &mut dropped_fields);

        let mut actions = Vec::new();
        let mut search_results = Vec::new();
        for call in validated {
            if call.name == ActionName::SearchDocuments.as_str() {
                match self.resolve_search(&call).await {
                    Ok(mut matches) => search_results.append(&mut matches),
                    Err(err) => {
                        warn!("search resolution failed: {err}");
                        dropped_fields.push(ActionName::SearchDocuments.as_str().to_string());
                    }
                }
            } else {
                actions.push(call);
            }
        }

        let mut reply_text = match reply.text {
            Some(text) if !text.trim().is_empty() => text,
            _ => fallback_reply(&actions, &search_results),
        };
        // The reply itself must answer a lookup, not just the side channel.
        if !search_results.is_empty() {
            reply_text.push_str(&search_summary(&search_results));
        }

        Ok(TurnOutcome {
            reply_text,
            actions,
            dropped_fields,
            search_results,
        })
    }

    /// Call the provider, retrying transient failures.
    ///
    /// Rate limits back off exponentially from `backoff_base`; other
    /// transient errors wait a fixed `retry_delay`. Non-transient errors
    /// surface immediately.
    async fn call_with_retry(&self, request: ChatRequest) -> Result<ModelReply> {
        let mut attempt: u32 = 0;
        loop {
            match self.provider.chat(request.clone()).await {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_transient() && attempt < self.config.max_retries => {
                    let delay = match &err {
                        AssistantError::RateLimited { .. } => {
                            self.config.backoff_base * 2u32.pow(attempt)
                        }
                        _ => self.config.retry_delay,
                    };
                    debug!(
                        "model call failed (attempt {}): {err}; retrying in {delay:?}",
                        attempt + 1
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn resolve_search(&self, call: &ActionCall) -> Result<Vec<SearchMatch>> {
        let retriever = self.retriever.as_ref().ok_or_else(|| {
            AssistantError::Validation("no retrieval system attached".to_string())
        })?;

        let query = call
            .arguments
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AssistantError::Validation("search without query".to_string()))?;

        let source_types: Option<Vec<SourceType>> = call
            .arguments
            .get("source_types")
            .and_then(|v| v.as_array())
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter_map(parse_source_type)
                    .collect()
            });

        let matches = retriever
            .search(query, source_types.as_deref(), self.config.search_top_k)
            .await?;
        Ok(matches)
    }
}

fn parse_source_type(value: &str) -> Option<SourceType> {
    match value {
        "document" => Some(SourceType::Document),
        "event" => Some(SourceType::Event),
        "conversation" => Some(SourceType::Conversation),
        _ => None,
    }
}

/// Validate model-requested calls against the declared vocabulary.
///
/// - A call whose name is not declared is dropped whole and flagged.
/// - An argument that is undeclared, mistyped, or outside its allowed set
///   is removed and flagged as `action.field`; the call survives.
/// - A call missing a required argument after removal is dropped and
///   flagged.
fn validate_actions(
    calls: Vec<ActionCall>,
    declarations: &[ActionDecl],
    dropped: &mut Vec<String>,
) -> Vec<ActionCall> {
    let mut validated = Vec::new();

    'calls: for mut call in calls {
        let Some(decl) = declarations.iter().find(|d| d.name.as_str() == call.name) else {
            warn!("dropping undeclared action: {}", call.name);
            dropped.push(call.name.clone());
            continue;
        };

        let argument_names: Vec<String> = call.arguments.keys().cloned().collect();
        for name in argument_names {
            let label = format!("{}.{name}", call.name);
            match decl.param(&name) {
                None => {
                    warn!("dropping undeclared argument: {label}");
                    call.arguments.remove(&name);
                    dropped.push(label);
                }
                Some(param) => {
                    if let Some(value) = call.arguments.get(&name)
                        && let Err(reason) = param.validate(value)
                    {
                        warn!("dropping invalid argument {label}: {reason}");
                        call.arguments.remove(&name);
                        dropped.push(label);
                    }
                }
            }
        }

        for param in decl.params.iter().filter(|p| p.required) {
            if !call.arguments.contains_key(&param.name) {
                warn!(
                    "dropping {} call: required argument {} missing",
                    call.name, param.name
                );
                dropped.push(call.name.clone());
                continue 'calls;
            }
        }

        validated.push(call);
    }

    validated
}

/// Deterministic reply when the model returned actions without text.
///
/// Built from the first action's arguments so the user sees what was just
/// set, not a contentless acknowledgement.
fn fallback_reply(actions: &[ActionCall], search_results: &[SearchMatch]) -> String {
    if !search_results.is_empty() {
        return format!(
            "Ho trovato {} risultati nei tuoi documenti.",
            search_results.len()
        );
    }

    let Some(first) = actions.first() else {
        return "Ok.".to_string();
    };
    let arg = |name: &str| first.arguments.get(name).and_then(|v| v.as_str());

    match first.name.as_str() {
        "update_event_details" => match (arg("title"), arg("start_datetime")) {
            (Some(title), Some(start)) => {
                format!("Ho segnato \"{title}\" per {start}. Va bene?")
            }
            (Some(title), None) => format!("Ho aggiornato \"{title}\". Va bene?"),
            (None, Some(start)) => format!("Ho spostato l'evento a {start}. Va bene?"),
            (None, None) => "Ho aggiornato i dettagli dell'evento.".to_string(),
        },
        "save_and_close_event" => "Evento salvato.".to_string(),
        "create_document" => match arg("title") {
            Some(title) => format!("Ho creato il documento \"{title}\"."),
            None => "Ho creato il documento.".to_string(),
        },
        "open_event" => "Apro l'evento.".to_string(),
        "highlight_upload_buttons" => {
            "Usa i pulsanti evidenziati per caricare il documento.".to_string()
        }
        _ => "Ok.".to_string(),
    }
}

/// Short excerpt of the best match, appended to the reply text.
fn search_summary(results: &[SearchMatch]) -> String {
    let Some(top) = results.first() else {
        return String::new();
    };
    format!("\n\nDai tuoi documenti: \"{}\"", top.text)
}
