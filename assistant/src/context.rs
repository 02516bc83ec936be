//! Prompt context assembly for a conversation turn.
//!
//! The orchestrator is stateless: everything the model needs to behave
//! correctly on this turn (draft form state, the user's categories, recent
//! events, the current date) is serialized into a fresh system instruction
//! every time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::AllowedValues;
use crate::draft::DraftEvent;

/// Most recent events included in the context; older ones are dropped.
pub const MAX_CONTEXT_EVENTS: usize = 20;

/// Who produced a dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role name in the model provider's wire format.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::User => "user",
            // Gemini calls the assistant role "model".
            Self::Assistant => "model",
        }
    }
}

/// One turn of dialogue history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// An event category the user has defined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A compact summary of an existing event, for grounding references like
/// "sposta la visita di martedì".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    pub start_datetime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
}

/// Everything the model needs to see for one turn.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// Current state of the draft event form, if one is open.
    pub draft: Option<DraftEvent>,

    /// The user's categories.
    pub categories: Vec<Category>,

    /// Recent events, newest first. Only the first
    /// [`MAX_CONTEXT_EVENTS`] are serialized.
    pub recent_events: Vec<EventSummary>,

    /// Current wall-clock time, used to resolve relative dates.
    pub now: DateTime<Utc>,
}

impl PromptContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            ..Default::default()
        }
    }

    pub fn with_draft(mut self, draft: DraftEvent) -> Self {
        self.draft = Some(draft);
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_recent_events(mut self, events: Vec<EventSummary>) -> Self {
        self.recent_events = events;
        self
    }

    /// Allowed values for enumerated action parameters on this turn.
    pub fn allowed_values(&self) -> AllowedValues {
        AllowedValues {
            category_ids: self.categories.iter().map(|c| c.id.clone()).collect(),
            ..Default::default()
        }
    }

    /// Build the system instruction for this turn.
    ///
    /// Always states the current date so the model can resolve "domani" and
    /// "martedì prossimo" without guessing the year.
    pub fn system_instruction(&self) -> String {
        let mut out = String::new();

        out.push_str(
            "Sei l'assistente personale di un'agenda. Aiuti l'utente a creare \
             e gestire eventi, scadenze e documenti. Rispondi sempre in italiano, \
             in modo breve e concreto.\n\n",
        );

        out.push_str(&format!(
            "Data e ora correnti: {}.\n",
            self.now.format("%A %d %B %Y, %H:%M UTC")
        ));

        match &self.draft {
            Some(draft) => {
                out.push_str("\nForm evento aperto. Stato attuale:\n");
                for (label, value) in [
                    ("titolo", draft.title.clone()),
                    ("inizio", draft.start_datetime.clone()),
                    ("fine", draft.end_datetime.clone()),
                    ("descrizione", draft.description.clone()),
                    ("luogo", draft.location.clone()),
                    ("importo", draft.amount.map(|a| format!("{a} EUR"))),
                    ("categoria", draft.category_id.clone()),
                    (
                        "ricorrenza",
                        draft.recurrence.map(|r| r.as_str().to_string()),
                    ),
                ] {
                    match value {
                        Some(value) if !value.is_empty() => {
                            out.push_str(&format!("- {label}: {value}\n"));
                        }
                        _ => {}
                    }
                }
                let missing = draft.missing_required_fields();
                if !missing.is_empty() {
                    out.push_str(&format!(
                        "Campi obbligatori ancora mancanti: {}.\n",
                        missing.join(", ")
                    ));
                }
            }
            None => out.push_str("\nNessun form evento aperto.\n"),
        }

        if !self.categories.is_empty() {
            out.push_str("\nCategorie disponibili (usa sempre l'ID):\n");
            for category in &self.categories {
                out.push_str(&format!("- {} (id: {})\n", category.name, category.id));
            }
        }

        if !self.recent_events.is_empty() {
            out.push_str("\nEventi recenti dell'utente:\n");
            for event in self.recent_events.iter().take(MAX_CONTEXT_EVENTS) {
                out.push_str(&format!(
                    "- [{}] {} — {}",
                    event.id, event.title, event.start_datetime
                ));
                if let Some(category) = &event.category_name {
                    out.push_str(&format!(" ({category})"));
                }
                out.push('\n');
            }
        }

        out.push_str(
            "\nRegole:\n\
             - Usa le funzioni dichiarate per ogni modifica al form; non \
               descrivere a parole un'azione che puoi richiedere come funzione.\n\
             - update_event_details accetta solo i campi da cambiare: non \
               ripetere i campi già compilati.\n\
             - Prima di save_and_close_event verifica che titolo e data di \
               inizio siano presenti; se mancano, chiedili.\n\
             - Per domande sui documenti dell'utente usa search_documents.\n\
             - Date e orari sempre in formato ISO 8601.\n",
        );

        out
    }
}

/// Keep only the most recent `max_turns` turns of history.
pub fn truncate_history(turns: &[ChatTurn], max_turns: usize) -> &[ChatTurn] {
    let start = turns.len().saturating_sub(max_turns);
    &turns[start..]
}
