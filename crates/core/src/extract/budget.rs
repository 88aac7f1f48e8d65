use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const MIN_BUDGET: f64 = 1_000.0;

static BUDGET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(?:rm|myr)\s*(\d[\d,]*(?:\.\d+)?)\s*(k|mil|million|mn|m)?\b",
        r"(?i)\b(\d[\d,]*(?:\.\d+)?)\s*(k|mil|million|mn)\b",
        r"(?i)\b(?:budget|allocated|allocate|spend|around|about)\s+(?:is\s+|of\s+)?(?:rm\s*)?(\d[\d,]*(?:\.\d+)?)\s*(k|mil|million|mn)?\b",
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Reads a renovation budget and normalizes it to whole thousands (`"50k"`).
/// Totals under RM 1,000 are treated as noise.
pub fn extract_budget(text: &str) -> Option<String> {
    BUDGET_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(text))
        .find_map(|captures| budget_total(&captures))
        .map(|total| format!("{}k", (total / 1_000.0).round() as u64))
}

fn budget_total(captures: &Captures<'_>) -> Option<f64> {
    let amount: f64 = captures.get(1)?.as_str().replace(',', "").parse().ok()?;
    let multiplier = match captures.get(2).map(|unit| unit.as_str().to_ascii_lowercase()) {
        Some(unit) if unit == "k" => 1_000.0,
        Some(_) => 1_000_000.0,
        None => 1.0,
    };
    let total = amount * multiplier;
    (total.is_finite() && total >= MIN_BUDGET).then_some(total)
}
