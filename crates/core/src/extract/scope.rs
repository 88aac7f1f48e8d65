use once_cell::sync::Lazy;
use regex::Regex;

use crate::extract::normalize;

// Group order matches SPACE_NAMES.
static SPACE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(concat!(
        r"\b(?:",
        r"(master bed(?:room)?s?)",
        r"|(living(?: room| area| hall)?)",
        r"|(kitchens?)",
        r"|(bed ?rooms?)",
        r"|(dining(?: room| area)?)",
        r"|(study(?: room)?)",
        r"|(home office|office (?:space|room|area))",
        r"|(retail(?: space| shop| lot)?)",
        r"|(bath ?rooms?|toilets?|washrooms?)",
        r"|((?:whole|entire|full) (?:unit|house|home))",
        r")\b",
    ))
    .ok()
});

const SPACE_NAMES: &[&str] = &[
    "master bedroom",
    "living",
    "kitchen",
    "bedroom",
    "dining",
    "study",
    "office",
    "retail",
    "bathroom",
    "whole unit",
];

// "living in Bangsar" is about residence, not the living room.
const LIVING_VERB_FOLLOWERS: &[&str] = &["in", "at", "near", "around", "with"];

/// Lists the spaces a renovation covers, in order of first mention.
pub fn extract_scope(text: &str) -> Option<String> {
    let pattern = SPACE_PATTERN.as_ref()?;
    let normalized = normalize(text);

    let mut spaces: Vec<&str> = Vec::new();
    for captures in pattern.captures_iter(&normalized) {
        let Some((index, found)) =
            captures.iter().enumerate().skip(1).find_map(|(index, group)| group.map(|found| (index, found)))
        else {
            continue;
        };
        let Some(space) = SPACE_NAMES.get(index - 1).copied() else { continue };

        let before = &normalized[..found.start()];
        let after = &normalized[found.end()..];
        if found.as_str() == "living"
            && after.split_whitespace().next().is_some_and(|word| LIVING_VERB_FOLLOWERS.contains(&word))
        {
            continue;
        }
        if space == "study" && before.split_whitespace().last() == Some("case") {
            continue;
        }
        if !spaces.contains(&space) {
            spaces.push(space);
        }
    }

    (!spaces.is_empty()).then(|| spaces.join(", "))
}
