//! Deterministic "agentic" query expansion (spec §4.4, §9 "the variant
//! generator is a pure function of the query string").

const SPLIT_CHARS: &[char] = &[',', ';', '/', '|', ':', '?', '!', '(', ')', '[', ']', '{', '}'];

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "of", "to", "in", "on", "for", "with", "is", "are", "what",
    "how", "why", "does", "do", "did", "this", "that", "it", "at", "by", "as",
];

#[derive(Debug, Clone, Copy)]
pub struct ExpansionConfig {
    pub enabled: bool,
    pub min_results: usize,
    pub max_variants: usize,
    pub max_iterations: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_results: 3,
            max_variants: 6,
            max_iterations: 2,
        }
    }
}

/// Generate up to `max_variants` deterministic rewrites of `query`:
/// splitting on punctuation and " and ", plus a stopword-stripped keyword
/// form. Case-insensitively deduplicated, with the original query excluded.
pub fn generate_variants(query: &str, max_variants: usize) -> Vec<String> {
    let mut variants = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let original_lower = query.trim().to_lowercase();
    seen.insert(original_lower.clone());

    let mut push_if_new = |variants: &mut Vec<String>, candidate: String| {
        let candidate = candidate.trim().to_string();
        if candidate.is_empty() || variants.len() >= max_variants {
            return;
        }
        let lower = candidate.to_lowercase();
        if seen.insert(lower) {
            variants.push(candidate);
        }
    };

    for part in split_on_separators(query) {
        push_if_new(&mut variants, part);
    }

    let keyword_query = strip_stopwords(query);
    push_if_new(&mut variants, keyword_query);

    variants.truncate(max_variants);
    variants
}

fn split_on_separators(query: &str) -> Vec<String> {
    let normalized = query.replace(" and ", ",");
    normalized
        .split(|c| SPLIT_CHARS.contains(&c))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Whether `query` has at least one token that isn't a stopword. Lexical
/// retrieval paths are skipped entirely when this is false (spec §4.4).
pub fn has_non_stopword_token(query: &str) -> bool {
    query
        .split_whitespace()
        .any(|word| !STOPWORDS.contains(&word.to_lowercase().as_str()))
}

fn strip_stopwords(query: &str) -> String {
    query
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(&word.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}
