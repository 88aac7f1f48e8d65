//! One-line opening greeting phrased by the LLM collaborator.

use std::sync::Arc;
use std::time::Duration;

use leadflow_core::config::{DialogueConfig, LlmConfig};
use leadflow_core::extract::normalize;
use tracing::{debug, warn};

use crate::guardrails::{GuardrailDecision, GuardrailIntent, GuardrailPolicy};
use crate::llm::{ChatMessage, LlmClient};

const GREETING_WORDS: &[&str] = &[
    "hi", "hello", "hey", "hai", "helo", "hii", "hiya", "yo", "there", "good", "morning",
    "afternoon", "evening", "greetings", "assalamualaikum", "salam",
];

/// True when the text is nothing but greeting words, e.g. "hi there".
pub fn is_bare_greeting(text: &str) -> bool {
    let normalized = normalize(text);
    let mut words = normalized.split_whitespace().peekable();
    words.peek().is_some() && words.all(|word| GREETING_WORDS.contains(&word))
}

#[derive(Clone)]
pub struct Greeter {
    llm: Arc<dyn LlmClient>,
    guardrails: GuardrailPolicy,
    company_name: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl Greeter {
    pub fn new(llm: Arc<dyn LlmClient>, company_name: impl Into<String>) -> Self {
        Self {
            llm,
            guardrails: GuardrailPolicy::default(),
            company_name: company_name.into(),
            temperature: 0.4,
            max_tokens: 80,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_config(llm: Arc<dyn LlmClient>, config: &LlmConfig, dialogue: &DialogueConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
            ..Self::new(llm, dialogue.company_name.clone())
        }
    }

    pub fn fallback(&self) -> String {
        format!("Hi there! Thanks for reaching out to {}.", self.company_name)
    }

    /// Guarded model greeting, or the static one on any failure.
    pub async fn greet(&self, user_text: &str) -> String {
        let messages = [
            ChatMessage::system(format!(
                "You greet visitors for {}, an interior design studio. Reply with one short, \
                 warm sentence. Do not ask questions, quote prices, promise anything or \
                 include links.",
                self.company_name
            )),
            ChatMessage::user(user_text.trim()),
        ];

        let generated = match tokio::time::timeout(
            self.timeout,
            self.llm.complete_chat(&messages, self.temperature, self.max_tokens),
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(error)) => {
                debug!(
                    event_name = "collaborator.llm.unavailable",
                    error = %error,
                    "greeting falls back to static text"
                );
                return self.fallback();
            }
            Err(_) => {
                warn!(
                    event_name = "collaborator.llm.timeout",
                    timeout_secs = self.timeout.as_secs(),
                    "greeting falls back to static text"
                );
                return self.fallback();
            }
        };

        let intent = GuardrailIntent::Greeting { text: generated };
        match self.guardrails.evaluate(&intent) {
            GuardrailDecision::Deny { reason_code, fallback_path } => {
                warn!(
                    event_name = "guardrail.denied",
                    action = intent.action_key(),
                    reason_code,
                    fallback_path,
                    "generated greeting rejected"
                );
                self.fallback()
            }
            decision => decision.into_text().unwrap_or_else(|| self.fallback()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use async_trait::async_trait;

    use crate::llm::{ChatMessage, LlmClient, NoopLlmClient};

    use super::{is_bare_greeting, Greeter};

    struct CannedLlm(&'static str);

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete_chat(
            &self,
            _messages: &[ChatMessage],
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn bare_greetings_are_recognized() {
        assert!(is_bare_greeting("Hi!"));
        assert!(is_bare_greeting("hello there"));
        assert!(is_bare_greeting("Good morning"));
        assert!(!is_bare_greeting("hi, I'm John"));
        assert!(!is_bare_greeting("   "));
    }

    #[tokio::test]
    async fn disabled_llm_uses_the_static_greeting() {
        let greeter = Greeter::new(Arc::new(NoopLlmClient), "Jablanc Interiors");

        assert_eq!(greeter.greet("hi").await, "Hi there! Thanks for reaching out to Jablanc Interiors.");
    }

    #[tokio::test]
    async fn guarded_model_text_is_used_or_replaced() {
        let friendly = Greeter::new(Arc::new(CannedLlm("Hello, lovely to meet you!")), "Studio");
        assert_eq!(friendly.greet("hi").await, "Hello, lovely to meet you!");

        let salesy = Greeter::new(Arc::new(CannedLlm("Hi! Renovations from RM 30k.")), "Studio");
        assert_eq!(salesy.greet("hi").await, "Hi there! Thanks for reaching out to Studio.");
    }
}
