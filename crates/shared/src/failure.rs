//! Failure taxonomy for explanation and chat requests.
//!
//! Every storage or transport problem is folded into one of these kinds at
//! the client boundary, so the overlay only ever sees a `FailureKind`.

use thiserror::Error;

/// Why a request produced no text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FailureKind {
    /// No API key is configured; no network call was made.
    #[error("no API key configured")]
    MissingCredential,
    /// The host environment was torn down while the request was running.
    #[error("extension context invalidated")]
    ContextInvalidated,
    /// The settings store could not be read.
    #[error("settings storage unavailable")]
    Storage,
    /// The request exceeded its deadline or was aborted.
    #[error("request timed out")]
    Timeout,
    /// The endpoint answered with a non-2xx status.
    #[error("API error: {status}")]
    ApiError { status: u16 },
    /// A 2xx body without `choices[0].message.content`.
    #[error("invalid response format from API")]
    MalformedResponse,
    #[error("unexpected failure")]
    Unknown,
}

/// Result of one explanation or chat request.
pub type RequestOutcome = Result<String, FailureKind>;

impl FailureKind {
    /// Text shown in the popup body when the explanation request fails.
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::MissingCredential => {
                "⚠️ Please set your Fireworks AI API key in the extension settings first!"
            }
            FailureKind::ContextInvalidated => {
                "⚠️ Extension was reloaded, please refresh the page."
            }
            FailureKind::Storage => "⚠️ Extension error, please refresh the page.",
            FailureKind::Timeout => "⚠️ Request timeout, try again.",
            FailureKind::ApiError { .. } => "⚠️ API Error. Check your API key in settings.",
            FailureKind::MalformedResponse => "⚠️ AI gave an unexpected answer, try again.",
            FailureKind::Unknown => "⚠️ AI is confused, try again.",
        }
    }

    /// Shorter line appended to the chat transcript when a follow-up fails.
    pub fn chat_message(&self) -> &'static str {
        match self {
            FailureKind::MissingCredential => "⚠️ API key not found!",
            FailureKind::ContextInvalidated => self.user_message(),
            _ => "⚠️ Failed to send message. Try again.",
        }
    }
}
