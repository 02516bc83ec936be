//! # Assistant
//!
//! This crate holds the conversational side of the organizer: the dialogue
//! contract with the external model, the fixed action vocabulary the model
//! may request, and the draft event the conversation is collaboratively
//! filling in.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Assistant Orchestration                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  PromptContext ──► Orchestrator ──► TurnOutcome                 │
//! │       │                 │                │                      │
//! │       ▼                 ▼                ▼                      │
//! │  DraftEvent       ChatProvider      ActionCall                  │
//! │                   (Gemini API)     (validated)                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The orchestrator is stateless across calls: dialogue history and draft
//! form state are passed in full on every turn. It never executes
//! `update_event_details` or `save_and_close_event` itself; it only reports
//! that the model requested them. `search_documents` is the one exception,
//! resolved inline against the retrieval system.

pub mod action;
pub mod context;
pub mod draft;
pub mod error;
pub mod orchestrator;
pub mod provider;

pub use action::{ActionCall, ActionDecl, ActionName, AllowedValues, ParamSpec, ParamType};
pub use context::{Category, ChatTurn, EventSummary, PromptContext, Role};
pub use draft::{DraftEvent, Recurrence};
pub use error::{AssistantError, Result};
pub use orchestrator::{Orchestrator, OrchestratorConfig, TurnOutcome};
pub use provider::{ChatProvider, ChatRequest, GeminiChatProvider, ModelReply};
