//! Error types for the assistant.

use thiserror::Error;

/// Result type alias for assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Errors that can occur while running a conversation turn.
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Model provider not configured.
    #[error("model provider not configured")]
    ProviderNotConfigured,

    /// Rate limited by the model provider, retries exhausted.
    ///
    /// Kept distinct from [`AssistantError::Provider`]: it signals "back off
    /// and retry later" to the end user rather than a hard failure.
    #[error("rate limited by model provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Model call failed (after local retries were exhausted).
    #[error("model provider error: {0}")]
    Provider(String),

    /// The model returned something the contract does not allow.
    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    /// Missing or malformed caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Retrieval error while resolving a search action.
    #[error("retrieval error: {0}")]
    Retrieval(#[from] agenda_retrieval::RetrievalError),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AssistantError {
    /// Whether the orchestrator may retry after this error.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Provider(_) | Self::Http(_)
        )
    }

    /// Generic user-facing message; provider internals stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "Troppe richieste. Attendi qualche secondo e riprova.",
            _ => "Si è verificato un errore. Riprova.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_is_distinct_to_the_user() {
        let rate_limited = AssistantError::RateLimited {
            retry_after_secs: 8,
        };
        let provider = AssistantError::Provider("boom".to_string());
        assert_ne!(rate_limited.user_message(), provider.user_message());
    }

    #[test]
    fn test_transient_classification() {
        assert!(
            AssistantError::RateLimited {
                retry_after_secs: 1
            }
            .is_transient()
        );
        assert!(AssistantError::Provider("502".to_string()).is_transient());
        assert!(!AssistantError::InvalidResponse("bad".to_string()).is_transient());
        assert!(!AssistantError::Validation("empty".to_string()).is_transient());
    }
}
