pub mod conversation;
pub mod failure;
pub mod store;

pub use conversation::{Conversation, Turn, TurnRole};
pub use failure::{FailureKind, RequestOutcome};

pub mod settings {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;
    use thiserror::Error;
    use zeroize::Zeroizing;

    /// Language used for explanations when the user never picked one.
    pub const DEFAULT_LANGUAGE: &str = "English";

    /// Environment variable consulted when no key is stored.
    pub const API_KEY_ENV: &str = "FIREWORKS_API_KEY";

    /// Bearer credential for the inference endpoint. Wiped from memory on drop.
    #[derive(Clone)]
    pub struct ApiKey(Zeroizing<String>);

    impl ApiKey {
        pub fn new(key: impl Into<String>) -> Self {
            Self(Zeroizing::new(key.into()))
        }

        pub fn expose(&self) -> &str {
            self.0.as_str()
        }

        pub fn is_blank(&self) -> bool {
            self.0.trim().is_empty()
        }
    }

    impl fmt::Debug for ApiKey {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("ApiKey(***)")
        }
    }

    impl Serialize for ApiKey {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(self.expose())
        }
    }

    impl<'de> Deserialize<'de> for ApiKey {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            String::deserialize(deserializer).map(ApiKey::new)
        }
    }

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum SettingsError {
        #[error("Please enter an API key")]
        MissingApiKey,
    }

    /// What the extension keeps in its key-value store.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Settings {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub api_key: Option<ApiKey>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub preferred_language: Option<String>,
    }

    impl Settings {
        /// Build settings from raw form input: the key is required, the
        /// language falls back to English.
        pub fn from_input(api_key: &str, language: &str) -> Result<Self, SettingsError> {
            let api_key = api_key.trim();
            if api_key.is_empty() {
                return Err(SettingsError::MissingApiKey);
            }
            let language = language.trim();
            Ok(Self {
                api_key: Some(ApiKey::new(api_key)),
                preferred_language: Some(if language.is_empty() {
                    DEFAULT_LANGUAGE.to_string()
                } else {
                    language.to_string()
                }),
            })
        }

        /// The usable credential, if any. Blank keys count as missing.
        pub fn api_key(&self) -> Option<&ApiKey> {
            self.api_key.as_ref().filter(|k| !k.is_blank())
        }

        pub fn language(&self) -> &str {
            self.preferred_language
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or(DEFAULT_LANGUAGE)
        }

        /// Fill a missing key from `FIREWORKS_API_KEY`.
        pub fn with_env_fallback(self) -> Self {
            self.with_key_fallback(std::env::var(API_KEY_ENV).ok())
        }

        pub(crate) fn with_key_fallback(mut self, fallback: Option<String>) -> Self {
            if self.api_key().is_none() {
                if let Some(key) = fallback.filter(|k| !k.trim().is_empty()) {
                    self.api_key = Some(ApiKey::new(key.trim()));
                }
            }
            self
        }
    }
}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        System,
        User,
        Assistant,
    }

    /// One entry of the `messages` array sent to the chat-completions endpoint.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ChatMessage {
        pub role: Role,
        pub content: String,
    }

    impl ChatMessage {
        pub fn system(content: impl Into<String>) -> Self {
            Self {
                role: Role::System,
                content: content.into(),
            }
        }

        pub fn user(content: impl Into<String>) -> Self {
            Self {
                role: Role::User,
                content: content.into(),
            }
        }

        pub fn assistant(content: impl Into<String>) -> Self {
            Self {
                role: Role::Assistant,
                content: content.into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::agent_api::ChatMessage;
    use super::settings::*;

    #[test]
    fn test_language_defaults_to_english() {
        let settings = Settings::default();
        assert_eq!(settings.language(), "English");

        let blank = Settings {
            preferred_language: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(blank.language(), "English");
    }

    #[test]
    fn test_from_input_requires_key() {
        assert_eq!(
            Settings::from_input("  ", "French").unwrap_err(),
            SettingsError::MissingApiKey
        );

        let settings = Settings::from_input(" fw_123 ", "").unwrap();
        assert_eq!(settings.api_key().unwrap().expose(), "fw_123");
        assert_eq!(settings.language(), "English");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let settings = Settings {
            api_key: Some(ApiKey::new("")),
            preferred_language: None,
        };
        assert!(settings.api_key().is_none());
    }

    #[test]
    fn test_key_fallback_only_fills_missing_key() {
        let filled = Settings::default().with_key_fallback(Some("from_env".into()));
        assert_eq!(filled.api_key().unwrap().expose(), "from_env");

        let kept = Settings::from_input("stored", "German")
            .unwrap()
            .with_key_fallback(Some("from_env".into()));
        assert_eq!(kept.api_key().unwrap().expose(), "stored");
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("secret");
        assert_eq!(format!("{:?}", key), "ApiKey(***)");
    }

    #[test]
    fn test_settings_json_shape() {
        let settings = Settings::from_input("k", "Spanish").unwrap();
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"api_key": "k", "preferred_language": "Spanish"})
        );
    }

    #[test]
    fn test_chat_message_wire_shape() {
        let msg = ChatMessage::system("be nice");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            serde_json::json!({"role": "system", "content": "be nice"})
        );
    }
}
