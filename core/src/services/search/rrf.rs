//! Reciprocal Rank Fusion over the semantic/lexical candidate lists
//! (spec §4.4).

use std::collections::HashMap;

/// RRF constant; larger values flatten the influence of rank position.
pub const RRF_K: f64 = 60.0;
pub const SEMANTIC_WEIGHT: f64 = 1.0;
pub const LEXICAL_WEIGHT: f64 = 0.85;

/// One ranked list going into fusion: items in descending-score order, each
/// keyed by `source_type:id` so knowledge and asset hits never collide.
pub type RankedList = Vec<String>;

/// Fuse any number of ranked lists into one score per key:
/// `Σ weight(list) / (K + rank_in_list + 1)`, summed over every list the key
/// appears in. Keys absent from a list simply don't contribute its term.
pub fn fuse(lists: &[(RankedList, f64)]) -> HashMap<String, f64> {
    let mut scores: HashMap<String, f64> = HashMap::new();
    for (list, weight) in lists {
        for (rank, key) in list.iter().enumerate() {
            let contribution = weight / (RRF_K + rank as f64 + 1.0);
            *scores.entry(key.clone()).or_insert(0.0) += contribution;
        }
    }
    scores
}

/// Merge lists by keeping each key's maximum raw score across lists — used
/// for single-mode (semantic-only or lexical-only) ranking, which is plain
/// max-score merge rather than RRF (spec §4.4 "Single-mode ranking").
pub fn merge_max_score(lists: &[Vec<(String, f32)>]) -> HashMap<String, f32> {
    let mut merged: HashMap<String, f32> = HashMap::new();
    for list in lists {
        for (key, score) in list {
            merged
                .entry(key.clone())
                .and_modify(|existing| {
                    if *score > *existing {
                        *existing = *score;
                    }
                })
                .or_insert(*score);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_in_both_lists_scores_higher_than_item_in_one() {
        let semantic = vec!["a".to_string(), "b".to_string()];
        let lexical = vec!["b".to_string(), "c".to_string()];
        let scores = fuse(&[(semantic, SEMANTIC_WEIGHT), (lexical, LEXICAL_WEIGHT)]);
        assert!(scores["b"] > scores["a"]);
        assert!(scores["b"] > scores["c"]);
    }

    #[test]
    fn top_rank_beats_lower_rank_within_one_list() {
        let semantic = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let scores = fuse(&[(semantic, SEMANTIC_WEIGHT)]);
        assert!(scores["a"] > scores["b"]);
        assert!(scores["b"] > scores["c"]);
    }

    #[test]
    fn max_score_merge_keeps_the_higher_value() {
        let merged = merge_max_score(&[
            vec![("a".to_string(), 0.5)],
            vec![("a".to_string(), 0.9), ("b".to_string(), 0.2)],
        ]);
        assert_eq!(merged["a"], 0.9);
        assert_eq!(merged["b"], 0.2);
    }
}
