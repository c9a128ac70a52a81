use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::ChatMessage;
use shared::settings::ApiKey;
use shared::store::SettingsStore;
use shared::{Conversation, FailureKind, RequestOutcome};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::prompts;

const DEFAULT_BASE_URL: &str = "https://api.fireworks.ai";
const COMPLETIONS_PATH: &str = "/inference/v1/chat/completions";
const DEFAULT_MODEL: &str = "sentientfoundation/dobby-unhinged-llama-3-3-70b-new";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

// ── Request types ────────────────────────────────────────────────────

/// Output bound and sampling temperature for one kind of request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl SamplingParams {
    pub const EXPLAIN: Self = Self {
        max_tokens: 150,
        temperature: 0.5,
    };
    pub const FOLLOW_UP: Self = Self {
        max_tokens: 200,
        temperature: 0.7,
    };
    pub const KEY_CHECK: Self = Self {
        max_tokens: 100,
        temperature: 0.7,
    };
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
}

// ── Response types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull `choices[0].message.content` out of a 2xx body.
fn extract_content(body: &[u8]) -> RequestOutcome {
    let parsed: CompletionResponse =
        serde_json::from_slice(body).map_err(|_| FailureKind::MalformedResponse)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or(FailureKind::MalformedResponse)
}

fn classify_transport(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        FailureKind::Timeout
    } else {
        FailureKind::Unknown
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Where requests go and how long they may take.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl EndpointConfig {
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        let parsed =
            Url::parse(base_url).with_context(|| format!("invalid base url: {base_url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow!("unsupported scheme: {}", parsed.scheme()));
        }
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}{}", self.base_url, COMPLETIONS_PATH)
    }
}

/// Issues explanation and follow-up requests.
///
/// Every call is a complete, independent request: no server-side session,
/// no retries. All storage and transport failures come back as a
/// [`FailureKind`].
pub struct ExplanationClient {
    http: Client,
    endpoint: EndpointConfig,
    store: Arc<dyn SettingsStore>,
}

impl ExplanationClient {
    pub fn new(endpoint: EndpointConfig, store: Arc<dyn SettingsStore>) -> Result<Self> {
        let http = Client::builder()
            .timeout(endpoint.timeout)
            .pool_max_idle_per_host(2)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            store,
        })
    }

    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    /// Language from settings, "English" when unset or unreadable.
    pub async fn preferred_language(&self) -> String {
        match self.store.load().await {
            Ok(settings) => settings.language().to_string(),
            Err(e) => {
                warn!("could not read language preference: {}", e);
                shared::settings::DEFAULT_LANGUAGE.to_string()
            }
        }
    }

    async fn credential(&self) -> Result<ApiKey, FailureKind> {
        let settings = self.store.load().await.map_err(|e| {
            warn!("settings load failed: {}", e);
            FailureKind::from(&e)
        })?;
        settings
            .api_key()
            .cloned()
            .ok_or(FailureKind::MissingCredential)
    }

    /// Ask for a short plain-language explanation of `text`.
    pub async fn request_explanation(&self, text: &str, language: &str) -> RequestOutcome {
        let key = self.credential().await?;
        let messages = [ChatMessage::user(prompts::explanation_prompt(text, language))];
        self.complete(&key, &messages, SamplingParams::EXPLAIN).await
    }

    /// Append `user_message`, send the whole thread, append the reply on success.
    ///
    /// Callers reject blank input before getting here.
    pub async fn send_follow_up(
        &self,
        conversation: &mut Conversation,
        user_message: &str,
        language: &str,
    ) -> RequestOutcome {
        conversation.push_user(user_message);
        let reply = self.follow_up_turn(conversation, language).await?;
        conversation.push_assistant(reply.clone());
        Ok(reply)
    }

    /// Send the transcript as it stands, without touching it.
    pub async fn follow_up_turn(
        &self,
        conversation: &Conversation,
        language: &str,
    ) -> RequestOutcome {
        let key = self.credential().await?;
        let messages = follow_up_messages(conversation, language);
        self.complete(&key, &messages, SamplingParams::FOLLOW_UP).await
    }

    /// Probe used by the settings screen before saving a key.
    pub async fn verify_api_key(
        &self,
        api_key: &ApiKey,
        language: &str,
    ) -> Result<(), FailureKind> {
        if api_key.is_blank() {
            return Err(FailureKind::MissingCredential);
        }
        let messages = [ChatMessage::user(prompts::key_check_prompt(language))];
        self.complete(api_key, &messages, SamplingParams::KEY_CHECK)
            .await
            .map(|_| ())
    }

    async fn complete(
        &self,
        key: &ApiKey,
        messages: &[ChatMessage],
        params: SamplingParams,
    ) -> RequestOutcome {
        let req = CompletionRequest {
            model: &self.endpoint.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        };
        debug!(
            messages = messages.len(),
            max_tokens = params.max_tokens,
            "sending completion request"
        );

        let resp = self
            .http
            .post(self.endpoint.completions_url())
            .header("Authorization", format!("Bearer {}", key.expose()))
            .header("Content-Type", "application/json")
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                warn!("completion request failed: {}", e);
                classify_transport(&e)
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let detail: String = body.chars().take(300).collect();
            warn!(status = status.as_u16(), "completion API error: {}", detail);
            return Err(FailureKind::ApiError {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| {
            warn!("reading completion body failed: {}", e);
            classify_transport(&e)
        })?;
        extract_content(&body).inspect_err(|_| warn!("completion body had no message content"))
    }
}

/// `[system(context), ...turns]`, oldest turn first.
pub fn follow_up_messages(conversation: &Conversation, language: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(conversation.turns().len() + 1);
    messages.push(ChatMessage::system(prompts::follow_up_system_prompt(
        conversation,
        language,
    )));
    messages.extend(conversation.transcript());
    messages
}
