//! Providers - remote model access for the explainer
//!
//! Talks to an OpenAI-compatible chat-completions endpoint to:
//! - explain selected text in plain language
//! - continue a follow-up chat about that explanation
//! - check that an API key works

pub mod explain;
pub mod prompts;

pub use explain::{EndpointConfig, ExplanationClient, SamplingParams};
