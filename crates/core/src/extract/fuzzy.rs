//! Edit-distance similarity used as a typo fallback by the gazetteer and style lexicon.

/// Normalized indel similarity in `0.0..=1.0`: `2 * lcs(a, b) / (|a| + |b|)`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let total = a_chars.len() + b_chars.len();
    if total == 0 {
        return 1.0;
    }

    (2 * longest_common_subsequence(&a_chars, &b_chars)) as f64 / total as f64
}

/// Best [`ratio`] between `term` and any run of consecutive tokens in `tokens`
/// that has the same token count as `term`.
pub fn window_ratio(tokens: &[&str], term: &str) -> f64 {
    let width = term.split_whitespace().count().max(1);
    if tokens.len() < width {
        return 0.0;
    }

    tokens
        .windows(width)
        .map(|window| ratio(&window.join(" "), term))
        .fold(0.0, f64::max)
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for a_char in a {
        for (j, b_char) in b.iter().enumerate() {
            current[j + 1] =
                if a_char == b_char { previous[j] + 1 } else { previous[j + 1].max(current[j]) };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
