//! Minimal TF-IDF vectoriser with cosine similarity
//!
//! Smoothed idf (`ln((1+n)/(1+df)) + 1`) and L2-normalised vectors, so the
//! cosine similarity of two transformed documents is their dot product.
//! Stopwords are removed before n-gram construction.

use std::collections::{HashMap, HashSet};

/// Lowercase word tokens of at least two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens.retain(|t| t.chars().count() >= 2);
    tokens
}

/// Contiguous n-grams of `tokens` for n in `min_n..=max_n`, space-joined.
fn ngrams(tokens: &[String], min_n: usize, max_n: usize) -> Vec<String> {
    let mut terms = Vec::new();
    for n in min_n..=max_n {
        if n == 0 || tokens.len() < n {
            continue;
        }
        for window in tokens.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}

/// Terms for one document: tokenize, drop stopwords, build n-grams.
pub fn document_terms(
    text: &str,
    stopwords: &HashSet<&str>,
    min_n: usize,
    max_n: usize,
) -> Vec<String> {
    let tokens: Vec<String> = tokenize(text)
        .into_iter()
        .filter(|t| !stopwords.contains(t.as_str()))
        .collect();
    ngrams(&tokens, min_n, max_n)
}

/// A fitted TF-IDF model over a fixed corpus vocabulary.
pub struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

/// Sparse L2-normalised document vector.
pub type TfidfVector = HashMap<usize, f64>;

impl TfidfModel {
    /// Fit on a corpus of term lists. Returns `None` when the corpus yields
    /// an empty vocabulary (the vectoriser-failure condition callers must
    /// handle with a fallback ranking).
    pub fn fit(corpus: &[Vec<String>]) -> Option<Self> {
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: Vec<usize> = Vec::new();

        for doc in corpus {
            let mut seen: HashSet<&str> = HashSet::new();
            for term in doc {
                if seen.insert(term) {
                    let next_index = vocabulary.len();
                    let index = *vocabulary.entry(term.clone()).or_insert(next_index);
                    if index == document_frequency.len() {
                        document_frequency.push(0);
                    }
                    document_frequency[index] += 1;
                }
            }
        }

        if vocabulary.is_empty() {
            return None;
        }

        let n = corpus.len() as f64;
        let idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Some(Self { vocabulary, idf })
    }

    /// Transform a term list into an L2-normalised tf-idf vector. Terms
    /// outside the fitted vocabulary are ignored.
    pub fn transform(&self, terms: &[String]) -> TfidfVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in terms {
            if let Some(&index) = self.vocabulary.get(term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }
        for (index, value) in counts.iter_mut() {
            *value *= self.idf[*index];
        }
        let norm = counts.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in counts.values_mut() {
                *value /= norm;
            }
        }
        counts
    }
}

/// Dot product of two L2-normalised sparse vectors.
pub fn cosine_similarity(a: &TfidfVector, b: &TfidfVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(index, value)| large.get(index).map(|other| value * other))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_stopwords() -> HashSet<&'static str> {
        HashSet::new()
    }

    #[test]
    fn tokenize_lowercases_and_drops_short() {
        assert_eq!(tokenize("The DB-index, v2!"), vec!["the", "db", "index", "v2"]);
        assert_eq!(tokenize("a b c"), Vec::<String>::new());
    }

    #[test]
    fn ngram_terms() {
        let stop = no_stopwords();
        let terms = document_terms("alpha beta gamma", &stop, 2, 3);
        assert_eq!(terms, vec!["alpha beta", "beta gamma", "alpha beta gamma"]);
    }

    #[test]
    fn identical_documents_have_similarity_one() {
        let stop = no_stopwords();
        let docs = vec![
            document_terms("database index performance", &stop, 1, 1),
            document_terms("completely unrelated words", &stop, 1, 1),
        ];
        let model = TfidfModel::fit(&docs).unwrap();
        let a = model.transform(&docs[0]);
        let same = model.transform(&docs[0]);
        let other = model.transform(&docs[1]);
        assert!((cosine_similarity(&a, &same) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&a, &other).abs() < 1e-9);
    }

    #[test]
    fn matching_document_scores_highest() {
        let stop = no_stopwords();
        let corpus = vec![
            document_terms("database schema design", &stop, 1, 1),
            document_terms("frontend styling tweaks", &stop, 1, 1),
        ];
        let model = TfidfModel::fit(&corpus).unwrap();
        let query = model.transform(&document_terms("database design", &stop, 1, 1));
        let sim0 = cosine_similarity(&query, &model.transform(&corpus[0]));
        let sim1 = cosine_similarity(&query, &model.transform(&corpus[1]));
        assert!(sim0 > sim1);
        assert!(sim1.abs() < 1e-9);
    }

    #[test]
    fn empty_vocabulary_reports_failure() {
        let docs = vec![Vec::<String>::new(), Vec::new()];
        assert!(TfidfModel::fit(&docs).is_none());
    }
}
