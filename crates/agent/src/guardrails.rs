use crate::side_answer::truncate_at_word;

/// Generated text the dialogue may show to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailIntent {
    Greeting { text: String },
}

impl GuardrailIntent {
    pub fn text(&self) -> &str {
        match self {
            Self::Greeting { text } => text,
        }
    }

    pub fn action_key(&self) -> &'static str {
        match self {
            Self::Greeting { .. } => "tone.greeting",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow { text: String },
    Deny { reason_code: &'static str, fallback_path: &'static str },
    Degrade { reason_code: &'static str, text: String, fallback_path: &'static str },
}

impl GuardrailDecision {
    /// Text to show, if any survived the check.
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Allow { text } | Self::Degrade { text, .. } => Some(text),
            Self::Deny { .. } => None,
        }
    }
}

const PRICING_MARKERS: &[&str] =
    &["rm", "myr", "price", "pricing", "cost", "discount", "cheapest", "guarantee", "free", "promo"];

/// Tone-only policy: the model may phrase a greeting, but never state prices,
/// links, promises, or ask for details itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardrailPolicy {
    pub max_chars: usize,
    pub allow_questions: bool,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self { max_chars: 160, allow_questions: false }
    }
}

impl GuardrailPolicy {
    pub fn evaluate(&self, intent: &GuardrailIntent) -> GuardrailDecision {
        let cleaned = intent.text().trim().trim_matches('"').trim();
        let first_line = cleaned.lines().map(str::trim).find(|line| !line.is_empty());
        let Some(line) = first_line else {
            return GuardrailDecision::Deny {
                reason_code: "empty_output",
                fallback_path: "static_greeting",
            };
        };

        let lower = line.to_lowercase();
        if lower.contains("http://") || lower.contains("https://") || lower.contains("www.") {
            return GuardrailDecision::Deny {
                reason_code: "contains_link",
                fallback_path: "static_greeting",
            };
        }

        let mentions_pricing = line.chars().any(|ch| ch.is_ascii_digit())
            || lower
                .split(|ch: char| !ch.is_alphanumeric())
                .any(|word| PRICING_MARKERS.contains(&word));
        if mentions_pricing {
            return GuardrailDecision::Deny {
                reason_code: "commercial_claim",
                fallback_path: "static_greeting",
            };
        }

        if !self.allow_questions && line.contains('?') {
            return GuardrailDecision::Deny {
                reason_code: "asks_question",
                fallback_path: "static_greeting",
            };
        }

        let multi_line = cleaned.lines().filter(|line| !line.trim().is_empty()).count() > 1;
        if line.chars().count() > self.max_chars {
            return GuardrailDecision::Degrade {
                reason_code: "too_long",
                text: truncate_at_word(line, self.max_chars),
                fallback_path: "truncated_greeting",
            };
        }
        if multi_line {
            return GuardrailDecision::Degrade {
                reason_code: "multi_line",
                text: line.to_string(),
                fallback_path: "first_line_only",
            };
        }

        GuardrailDecision::Allow { text: line.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::{GuardrailDecision, GuardrailIntent, GuardrailPolicy};

    fn greeting(text: &str) -> GuardrailIntent {
        GuardrailIntent::Greeting { text: text.to_string() }
    }

    #[test]
    fn friendly_single_line_is_allowed() {
        let decision = GuardrailPolicy::default()
            .evaluate(&greeting("  \"Hello! Lovely to hear from you.\"  "));

        assert_eq!(
            decision,
            GuardrailDecision::Allow { text: "Hello! Lovely to hear from you.".to_string() }
        );
    }

    #[test]
    fn pricing_and_links_are_denied() {
        let policy = GuardrailPolicy::default();

        let (reason_code, fallback_path) =
            match policy.evaluate(&greeting("Hi! Packages start from RM 30k.")) {
                GuardrailDecision::Deny { reason_code, fallback_path } => {
                    (reason_code, fallback_path)
                }
                _ => ("", ""),
            };
        assert_eq!(reason_code, "commercial_claim");
        assert_eq!(fallback_path, "static_greeting");

        assert!(matches!(
            policy.evaluate(&greeting("Hi, see https://example.test")),
            GuardrailDecision::Deny { reason_code: "contains_link", .. }
        ));
        assert!(matches!(
            policy.evaluate(&greeting("Hi! What's your name?")),
            GuardrailDecision::Deny { reason_code: "asks_question", .. }
        ));
        assert!(policy.evaluate(&greeting("   ")).into_text().is_none());
    }

    #[test]
    fn long_or_multi_line_output_degrades() {
        let policy = GuardrailPolicy { max_chars: 20, allow_questions: false };

        let decision = policy.evaluate(&greeting("Hello there and welcome to the studio"));
        assert_eq!(
            decision,
            GuardrailDecision::Degrade {
                reason_code: "too_long",
                text: "Hello there and...".to_string(),
                fallback_path: "truncated_greeting",
            }
        );

        let decision = GuardrailPolicy::default().evaluate(&greeting("Hello!\nHappy to help."));
        assert_eq!(decision.into_text().as_deref(), Some("Hello!"));
    }
}
