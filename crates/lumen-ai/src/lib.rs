//! AI-generated reflective content: sage wisdom and summaries for single
//! entries, personalized topics from recent writing, and long-form reviews.
//!
//! The provider is treated as opaque and best-effort. Structured responses
//! (wisdom, summary, topics) go through a two-stage parse — direct JSON
//! first, then bracket extraction from surrounding prose — and degrade to a
//! typed fallback value rather than failing the request on a model that
//! would not produce clean JSON.

pub mod client;
pub mod prompts;

use serde::de::DeserializeOwned;
use tracing::warn;

use lumen_types::models::{ReviewKind, SageWisdom};

pub use client::{AiError, ChatClient, ChatMessage};
pub use prompts::Language;

pub struct AiService {
    client: ChatClient,
}

impl AiService {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: ChatClient::new(api_key, model)?,
        })
    }

    /// Mid-writing wisdom from the four sages for a draft entry.
    pub async fn generate_wisdom(
        &self,
        topic: &str,
        content: &str,
        language: Language,
    ) -> Result<Vec<SageWisdom>, AiError> {
        let messages = [
            ChatMessage::system(prompts::wisdom_system(language)),
            ChatMessage::user(prompts::wisdom_user(topic, content, language)),
        ];
        let raw = self.client.chat(&messages, 4096, 0.8).await?;
        Ok(parse_json_payload(&raw).unwrap_or_else(|| {
            warn!("wisdom response was not parseable JSON, using fallback");
            fallback_wisdom(language)
        }))
    }

    /// Concluding wisdom for a completed entry.
    pub async fn generate_summary(
        &self,
        topic: &str,
        content: &str,
        language: Language,
    ) -> Result<Vec<SageWisdom>, AiError> {
        let messages = [
            ChatMessage::system(prompts::summary_system(language)),
            ChatMessage::user(prompts::summary_user(topic, content, language)),
        ];
        let raw = self.client.chat(&messages, 4096, 0.8).await?;
        Ok(parse_json_payload(&raw).unwrap_or_else(|| {
            warn!("summary response was not parseable JSON, using fallback");
            fallback_wisdom(language)
        }))
    }

    /// Personalized writing prompts derived from recent entries.
    pub async fn generate_topics(
        &self,
        recent_entries: &[String],
        language: Language,
    ) -> Result<Vec<String>, AiError> {
        let messages = [
            ChatMessage::system(prompts::topics_system(language)),
            ChatMessage::user(prompts::topics_user(recent_entries, language)),
        ];
        let raw = self.client.chat(&messages, 2048, 0.9).await?;
        Ok(parse_json_payload(&raw).unwrap_or_else(|| {
            warn!("topics response was not parseable JSON, using fallback");
            fallback_topics(language)
        }))
    }

    /// Long-form analysis of the whole journal; free text, no fallback.
    pub async fn generate_review(
        &self,
        kind: ReviewKind,
        entries: &[String],
        language: Language,
    ) -> Result<String, AiError> {
        let messages = [
            ChatMessage::system(prompts::review_system(kind, language)),
            ChatMessage::user(prompts::review_user(kind, entries, language)),
        ];
        self.client.chat(&messages, 8192, 0.7).await
    }
}

/// Two-stage parse: the raw response as JSON, then the widest bracketed
/// slice (models often wrap the array in prose or a code fence).
fn parse_json_payload<T: DeserializeOwned>(raw: &str) -> Option<T> {
    if let Ok(parsed) = serde_json::from_str(raw) {
        return Some(parsed);
    }
    let start = raw.find('[')?;
    let end = raw.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn sage(name: &str, emoji: &str, message: &str) -> SageWisdom {
    SageWisdom {
        sage: name.to_string(),
        emoji: emoji.to_string(),
        message: message.to_string(),
    }
}

/// Typed defaults used when the provider answers with something unparseable.
pub fn fallback_wisdom(language: Language) -> Vec<SageWisdom> {
    match language {
        Language::En => vec![
            sage(
                "Messenger of Love",
                "✨",
                "Child, every moment of gratitude is a seed of love planted in the garden of your soul.",
            ),
            sage("Awakened One", "🪷", "In this moment of awareness, what do you truly see?"),
            sage(
                "Lao Tzu",
                "☯️",
                "The river does not struggle to flow. What flows naturally in your heart?",
            ),
            sage("Plato", "🏛️", "What is the essence of what you are grateful for?"),
        ],
        Language::Zh => vec![
            sage("爱之使者", "✨", "孩子，每一刻的感恩都是你在心灵花园里播下的爱的种子。"),
            sage("觉者", "🪷", "在这觉知的时刻，你真正看到了什么？"),
            sage("老子", "☯️", "河水不争而自流。你心中自然流淌的是什么？"),
            sage("柏拉图", "🏛️", "你所感恩之事的本质是什么？"),
        ],
    }
}

pub fn fallback_topics(language: Language) -> Vec<String> {
    let topics: &[&str] = match language {
        Language::En => &[
            "What small moment today made you smile?",
            "Who has influenced your life recently?",
            "What are you looking forward to?",
            "What challenge helped you grow?",
            "What beauty did you notice today?",
        ],
        Language::Zh => &[
            "今天有什么小事让你微笑了？",
            "最近谁影响了你的生活？",
            "你在期待什么？",
            "什么挑战帮助你成长了？",
            "今天你注意到了什么美好？",
        ],
    };
    topics.iter().map(|t| t.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_json_array_parses() {
        let raw = r#"[{"sage": "Plato", "emoji": "🏛️", "message": "Know thyself."}]"#;
        let parsed: Vec<SageWisdom> = parse_json_payload(raw).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].sage, "Plato");
    }

    #[test]
    fn array_is_extracted_from_surrounding_prose() {
        let raw = "Here are the messages:\n```json\n[{\"sage\": \"Lao Tzu\", \"emoji\": \"☯️\", \
                   \"message\": \"Soft overcomes hard.\"}]\n```\nHope this helps!";
        let parsed: Vec<SageWisdom> = parse_json_payload(raw).unwrap();
        assert_eq!(parsed[0].sage, "Lao Tzu");
    }

    #[test]
    fn garbage_yields_none() {
        assert!(parse_json_payload::<Vec<SageWisdom>>("the sages are silent today").is_none());
        assert!(parse_json_payload::<Vec<SageWisdom>>("] backwards [").is_none());
    }

    #[test]
    fn topics_parse_as_plain_strings() {
        let raw = r#"["What did you let go of?", "Where did you find stillness?"]"#;
        let parsed: Vec<String> = parse_json_payload(raw).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn fallback_always_has_four_sages() {
        assert_eq!(fallback_wisdom(Language::En).len(), 4);
        assert_eq!(fallback_wisdom(Language::Zh).len(), 4);
        assert_eq!(fallback_topics(Language::En).len(), 5);
    }
}
