//! Fixed reply texts and the context-aware follow-up table.

use leadflow_core::checklist::FieldChecklist;
use leadflow_core::config::DialogueConfig;
use leadflow_core::domain::slot::Slot;
use leadflow_core::domain::state::ConversationState;
use leadflow_core::extract::normalize;

const STYLE_TOPIC_WORDS: &[&str] = &["style", "design", "aesthetic", "look", "vibe", "theme"];
const SIMILAR_TOPIC_WORDS: &[&str] = &["similar", "like this", "same", "type"];
const PRICE_TOPIC_WORDS: &[&str] = &["cost", "price", "budget", "expensive"];

const STATIC_PORTFOLIO_EXAMPLES: [&str; 3] =
    ["Modern Minimalist Design", "Contemporary Living Space", "Scandinavian Style Interior"];

pub const CONFIRM_PREFIX: &str = "Just to confirm,";

#[derive(Clone, Debug)]
pub struct ResponseComposer {
    company_name: String,
    consultant_name: String,
    portfolio_url: String,
    office_address: Option<String>,
}

impl ResponseComposer {
    pub fn from_config(config: &DialogueConfig) -> Self {
        Self {
            company_name: config.company_name.clone(),
            consultant_name: config.consultant_name.clone(),
            portfolio_url: config.portfolio_url.clone(),
            office_address: config.office_address.clone(),
        }
    }

    pub fn has_office_address(&self) -> bool {
        self.office_address.as_deref().is_some_and(|address| !address.trim().is_empty())
    }

    /// `preview` is an optional "Examples: ..." line; without it a static list
    /// pointing at the portfolio page is used.
    pub fn portfolio_reply(&self, preview: Option<String>) -> String {
        let head = format!("Yes sure, you may look at our portfolio here {}.", self.portfolio_url);
        let examples = preview.unwrap_or_else(|| self.static_portfolio_preview());
        format!("{head}\n{examples}")
    }

    fn static_portfolio_preview(&self) -> String {
        let items: Vec<String> = STATIC_PORTFOLIO_EXAMPLES
            .iter()
            .map(|title| format!("{title} ({})", self.portfolio_url))
            .collect();
        format!("Examples: {}", items.join("; "))
    }

    pub fn pricing_reply(&self) -> String {
        "Every project is priced on its own, since cost depends on the size of the space, the \
         scope of work and the materials chosen. Our designer will share a proper quotation \
         after a short consultation."
            .to_string()
    }

    pub fn services_reply(&self) -> String {
        format!(
            "{} handles interior design and renovation for homes and commercial spaces, from \
             concept and 3D visualisation through to build and handover.",
            self.company_name
        )
    }

    /// Configured address first, then a searched snippet, then a contact nudge.
    pub fn office_address_reply(&self, searched: Option<String>) -> String {
        if let Some(address) = self.office_address.as_deref().filter(|a| !a.trim().is_empty()) {
            return format!("Our office is at {}.", address.trim().trim_end_matches('.'));
        }
        searched.unwrap_or_else(|| "Please contact us for our office address details.".to_string())
    }

    pub fn style_link_line(link: &str) -> String {
        format!("Sure, here's one project that fits: {link}")
    }

    pub fn phone_hold_message(&self) -> String {
        "No worries, we can sort out contact details later. Feel free to tell me more about \
         your project in the meantime."
            .to_string()
    }

    /// Summary of every filled slot, checklist fields first, in a fixed order.
    pub fn completion_message(&self, state: &ConversationState, checklist: &FieldChecklist) -> String {
        let mut ordered: Vec<Slot> = checklist.fields().iter().map(|field| field.slot).collect();
        ordered.extend(Slot::ALL.iter().copied().filter(|slot| checklist.field(*slot).is_none()));

        let summary = ordered
            .iter()
            .filter_map(|slot| state.slot(*slot).map(|value| format!("{}: {value}", slot.label())))
            .collect::<Vec<String>>()
            .join(", ");

        format!(
            "Perfect! Thank you. I have all the details I need - {summary}. {} from {} will \
             follow up with you soon.",
            self.consultant_name, self.company_name
        )
    }
}

/// "Just to confirm, {question}" with the question's first letter lowered.
pub fn confirm(question: &str) -> String {
    let mut chars = question.chars();
    let lowered = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{CONFIRM_PREFIX} {lowered}")
}

/// Follow-up phrasing after a direct answer. Keyword branches look at what the
/// user asked about; otherwise the first missing required field in checklist
/// order is used. `phone_allowed` removes phone from consideration.
pub fn follow_up_question(
    text: &str,
    state: &ConversationState,
    checklist: &FieldChecklist,
    phone_allowed: bool,
) -> Option<(Slot, String)> {
    let missing: Vec<Slot> = checklist
        .missing_required(state)
        .into_iter()
        .filter(|slot| phone_allowed || *slot != Slot::Phone)
        .collect();
    if missing.is_empty() {
        return None;
    }

    let normalized = normalize(text);
    let mentions = |words: &[&str]| words.iter().any(|word| normalized.contains(word));

    let branch: &[(Slot, &str)] = if mentions(STYLE_TOPIC_WORDS) {
        &[
            (Slot::Style, "What style catches your eye? Modern, minimalist, or something else?"),
            (Slot::Location, "Which area is your property located in?"),
            (Slot::Budget, "What's your budget range for this project?"),
        ]
    } else if mentions(SIMILAR_TOPIC_WORDS) {
        &[
            (
                Slot::Location,
                "Where is your property located? This helps me suggest similar projects in your area.",
            ),
            (Slot::Style, "Which style from our portfolio appeals to you most?"),
            (Slot::Budget, "What budget range are you working with?"),
        ]
    } else if mentions(PRICE_TOPIC_WORDS) {
        &[
            (Slot::Budget, "What's your allocated budget for this project?"),
            (Slot::Location, "Which area is the property? Location affects pricing and logistics."),
            (Slot::Style, "What design style are you considering?"),
        ]
    } else {
        &[]
    };

    if let Some((slot, question)) = branch.iter().find(|(slot, _)| missing.contains(slot)) {
        return Some((*slot, (*question).to_string()));
    }

    let slot = missing[0];
    let question = match slot {
        Slot::Style => "Based on our portfolio, what style direction interests you?".to_string(),
        Slot::Location => {
            "Which area is your property located? This helps me recommend relevant projects."
                .to_string()
        }
        Slot::Budget => "What's your budget range? This helps me suggest suitable options.".to_string(),
        Slot::Name => "May I have your name so I can personalize our consultation?".to_string(),
        Slot::Phone => "What's the best number to reach you for follow-up?".to_string(),
        Slot::Scope => checklist.question_for(slot),
    };
    Some((slot, question))
}
