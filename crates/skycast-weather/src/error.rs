//! Error types for weather fetches.

use thiserror::Error;

use skycast_store::StoreError;

use crate::resource::ErrorSignal;

/// Errors that can end a fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API key rejected ({code}): {message}")]
    Auth { code: u16, message: String },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Cache error: {0}")]
    Store(#[from] StoreError),
}

impl FetchError {
    /// Collapse into the code and message pair carried by error states.
    /// HTTP failures keep their status; everything else reports code 0.
    pub fn signal(&self) -> ErrorSignal {
        match self {
            FetchError::Auth { code, message } => ErrorSignal {
                code: *code,
                message: message.clone(),
            },
            FetchError::Api { status, message } => ErrorSignal {
                code: *status,
                message: message.clone(),
            },
            FetchError::Transport(_) | FetchError::Decode(_) | FetchError::Store(_) => {
                ErrorSignal { code: 0, message: self.to_string() }
            }
        }
    }

    /// Whether a later attempt could plausibly succeed on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::Api { .. })
    }

    /// Short description suitable for end users.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Transport(_) => {
                "Network error. Please check your connection.".to_string()
            }
            FetchError::Auth { .. } => {
                "The weather service rejected the API key.".to_string()
            }
            FetchError::Api { status, .. } => {
                format!("The weather service returned an error ({status}).")
            }
            FetchError::Decode(_) => {
                "The weather service sent an unreadable response.".to_string()
            }
            FetchError::Store(_) => "Local weather cache error.".to_string(),
        }
    }
}
