//! Stopword lists for relevance scoring
//!
//! Standard English stopwords plus domain extras: mathematical boilerplate
//! and descriptor words that appear in nearly every node of a dictation
//! about quantities, so they carry no discriminative weight.

use std::collections::HashSet;
use std::sync::OnceLock;

const ENGLISH: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
    "will", "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain",
    "aren", "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn",
    "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn", "all",
];

/// Terms that appear in most formula-style utterances.
const MATH: &[&str] = &[
    "average", "number", "total", "sum", "equals", "equation", "per", "each", "every",
    "count", "amount",
];

/// Common descriptors in the quantity domain.
const DESCRIPTORS: &[&str] = &[
    "adult", "newborn", "children", "child", "baby", "babies", "young", "old", "male",
    "female",
];

/// English stopwords only.
pub fn english_stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| ENGLISH.iter().copied().collect())
}

/// English stopwords extended with the domain lists.
pub fn domain_aware_stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        ENGLISH
            .iter()
            .chain(MATH.iter())
            .chain(DESCRIPTORS.iter())
            .copied()
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_set_is_superset_of_english() {
        let english = english_stopwords();
        let domain = domain_aware_stopwords();
        assert!(english.iter().all(|w| domain.contains(w)));
        assert!(domain.contains("average"));
        assert!(domain.contains("newborn"));
        assert!(!english.contains("average"));
    }
}
