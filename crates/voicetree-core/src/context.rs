//! Graph-aware context selection
//!
//! Projects the tree down to the <= N nodes most relevant to a query so
//! prompts stay bounded. Ranking is dependency-aware first (formula
//! utterances), then TF-IDF with phrase boosting, with a keyword-overlap
//! fallback when the corpus gives the vectoriser nothing to work with.
//! Returned nodes are deep copies; callers cannot mutate the tree through
//! them.

use crate::node::{Node, NodeId};
use crate::params::{
    extract_defined_parameter, extract_defined_parameters_from_metadata,
    extract_needed_parameters,
};
use crate::stopwords::{domain_aware_stopwords, english_stopwords};
use crate::tfidf::{cosine_similarity, document_terms, tokenize, TfidfModel};
use crate::tree::DecisionTree;
use std::collections::HashSet;
use tracing::{debug, info};

const SIMILARITY_THRESHOLD: f64 = 0.01;
const NGRAM_WEIGHT: f64 = 2.0;

/// Select up to `limit` nodes relevant to `query`, as deep copies in
/// ascending id order. Without a query, falls back to branching factor.
pub fn get_most_relevant_nodes(tree: &DecisionTree, limit: usize, query: Option<&str>) -> Vec<Node> {
    if limit == 0 || tree.is_empty() {
        return Vec::new();
    }

    // Ranking only matters once the tree outgrows the projection budget.
    if tree.node_count() <= limit {
        let mut ids: Vec<NodeId> = tree.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        return ids.into_iter().filter_map(|id| tree.get(id).cloned()).collect();
    }

    let mut selected: Vec<NodeId> = match query {
        Some(query) if !query.trim().is_empty() => {
            let ranked = get_semantically_related_nodes(tree, query, limit, &HashSet::new());
            if !ranked.is_empty() {
                let names: Vec<&str> = ranked
                    .iter()
                    .filter_map(|id| tree.get(*id).map(|n| n.title.as_str()))
                    .collect();
                info!("semantically related nodes: {:?}", names);
            }
            ranked
        }
        _ => tree.get_nodes_by_branching_factor(Some(limit)),
    };

    selected.truncate(limit);
    selected.sort_unstable();
    selected.dedup();
    selected
        .into_iter()
        .filter_map(|id| tree.get(id).cloned())
        .collect()
}

/// Rank node ids by relevance to `query`, most relevant first. Nodes in
/// `already_selected` are excluded. Deterministic for a fixed tree state.
pub fn get_semantically_related_nodes(
    tree: &DecisionTree,
    query: &str,
    limit: usize,
    already_selected: &HashSet<NodeId>,
) -> Vec<NodeId> {
    let mut candidates: Vec<NodeId> = tree
        .iter()
        .map(|(id, _)| *id)
        .filter(|id| !already_selected.contains(id))
        .collect();
    candidates.sort_unstable();

    if candidates.is_empty() {
        return Vec::new();
    }

    let mut selected = Vec::new();

    // Dependency-aware fast path for formula utterances.
    if query.to_lowercase().contains("equals") {
        let needed = extract_needed_parameters(query);
        if !needed.is_empty() {
            debug!("dependency-aware search for {:?}", needed);
            let mut matched = Vec::new();
            for &id in &candidates {
                let node = match tree.get(id) {
                    Some(n) => n,
                    None => continue,
                };
                let defined = defined_parameters(node);
                if defined.iter().any(|p| needed.contains(p)) {
                    debug!("node {} defines a needed parameter", id);
                    matched.push(id);
                }
            }
            for id in matched {
                selected.push(id);
                if selected.len() >= limit {
                    return selected;
                }
            }
            candidates.retain(|id| !selected.contains(id));
        }
    }

    // De-duplicate query words (first occurrence order) so repeated words
    // in rambling speech do not inflate term frequency.
    let mut seen = HashSet::new();
    let deduplicated_query: Vec<String> = tokenize(query)
        .into_iter()
        .filter(|w| seen.insert(w.clone()))
        .collect();
    let deduplicated_query = deduplicated_query.join(" ");

    let remaining = limit - selected.len();
    if remaining == 0 || candidates.is_empty() {
        return selected;
    }

    match rank_by_tfidf(tree, &candidates, &deduplicated_query, remaining) {
        Some(ranked) => selected.extend(ranked),
        None => {
            // Vectoriser produced no vocabulary; score by keyword overlap.
            debug!("tf-idf unavailable, falling back to keyword overlap");
            selected.extend(rank_by_keywords(tree, &candidates, &deduplicated_query, remaining));
        }
    }

    selected
}

fn defined_parameters(node: &Node) -> Vec<String> {
    if !node.content.is_empty() {
        let from_metadata = extract_defined_parameters_from_metadata(&node.content);
        if !from_metadata.is_empty() {
            return from_metadata;
        }
        if let Some(param) = extract_defined_parameter(&node.content) {
            return vec![param];
        }
        Vec::new()
    } else {
        let text = format!("{} {}", node.title, node.summary);
        extract_defined_parameter(&text).into_iter().collect()
    }
}

/// Title is weighted three times over summary so name matches dominate, and
/// phrase (bigram/trigram) similarity is boosted over loose word overlap.
fn rank_by_tfidf(
    tree: &DecisionTree,
    candidates: &[NodeId],
    query: &str,
    limit: usize,
) -> Option<Vec<NodeId>> {
    let stopwords = domain_aware_stopwords();

    let weighted: Vec<String> = candidates
        .iter()
        .filter_map(|id| tree.get(*id))
        .map(|n| format!("{} {} {} {}", n.title, n.title, n.title, n.summary))
        .collect();

    let unigram_corpus: Vec<Vec<String>> = weighted
        .iter()
        .map(|text| document_terms(text, stopwords, 1, 1))
        .collect();
    let ngram_corpus: Vec<Vec<String>> = weighted
        .iter()
        .map(|text| document_terms(text, stopwords, 2, 3))
        .collect();

    let unigram_model = TfidfModel::fit(&unigram_corpus)?;
    let unigram_query = unigram_model.transform(&document_terms(query, stopwords, 1, 1));
    if unigram_query.is_empty() {
        return None;
    }

    // The phrase model may legitimately be empty (single-word titles).
    let ngram_model = TfidfModel::fit(&ngram_corpus);
    let ngram_query = ngram_model
        .as_ref()
        .map(|m| m.transform(&document_terms(query, stopwords, 2, 3)));

    let mut scored: Vec<(NodeId, f64)> = candidates
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            let unigram_sim =
                cosine_similarity(&unigram_query, &unigram_model.transform(&unigram_corpus[i]));
            let ngram_sim = match (&ngram_model, &ngram_query) {
                (Some(model), Some(query_vec)) => {
                    cosine_similarity(query_vec, &model.transform(&ngram_corpus[i]))
                }
                _ => 0.0,
            };
            (id, unigram_sim + NGRAM_WEIGHT * ngram_sim)
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));

    Some(
        scored
            .into_iter()
            .take_while(|(_, score)| *score > SIMILARITY_THRESHOLD)
            .take(limit)
            .map(|(id, _)| id)
            .collect(),
    )
}

/// Keyword-overlap fallback: title hits count 3.0, summary hits 1.0,
/// normalised by query token count.
fn rank_by_keywords(
    tree: &DecisionTree,
    candidates: &[NodeId],
    query: &str,
    limit: usize,
) -> Vec<NodeId> {
    let query_tokens = keyword_tokens(query);
    if query_tokens.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(NodeId, f64)> = Vec::new();
    for &id in candidates {
        let node = match tree.get(id) {
            Some(n) => n,
            None => continue,
        };
        let title_tokens = keyword_tokens(&node.title);
        let summary_tokens = keyword_tokens(&node.summary);
        let mut score = 0.0;
        for token in &query_tokens {
            if title_tokens.contains(token) {
                score += 3.0;
            }
            if summary_tokens.contains(token) {
                score += 1.0;
            }
        }
        score /= query_tokens.len() as f64;
        if score > 0.0 {
            scored.push((id, score));
        }
    }

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then(a.0.cmp(&b.0)));
    scored.into_iter().take(limit).map(|(id, _)| id).collect()
}

fn keyword_tokens(text: &str) -> HashSet<String> {
    let stopwords = english_stopwords();
    tokenize(text)
        .into_iter()
        .filter(|t| !stopwords.contains(t.as_str()))
        .collect()
}

/// Render selected nodes as prompt blocks.
pub fn format_nodes_for_prompt(nodes: &[Node], tree: &DecisionTree) -> String {
    if nodes.is_empty() {
        return "No nodes available".to_string();
    }

    let mut out = String::from("===== Available Nodes =====\n");
    for node in nodes {
        out.push_str(&format!("Node ID: {}\n", node.id));
        out.push_str(&format!("Title: {}\n", node.title));
        out.push_str(&format!("Summary: {}\n", node.summary));
        if let Some(pid) = node.parent_id {
            if let (Some(rel), Some(parent)) = (node.relationships.get(&pid), tree.get(pid)) {
                out.push_str(&format!("Relationship: {} ('{}')\n", rel, parent.title));
            }
        }
        out.push_str("----------------------------------------\n");
    }
    out.push_str("==========================");
    out
}

/// `Title: summary` lines for the most recently touched nodes.
pub fn get_node_summaries(tree: &DecisionTree, max_nodes: usize) -> String {
    let recent = tree.get_recent_nodes(max_nodes);
    if recent.is_empty() {
        return "No existing nodes yet".to_string();
    }
    recent
        .iter()
        .filter_map(|id| tree.get(*id))
        .map(|n| format!("{}: {}", n.title, n.summary))
        .collect::<Vec<_>>()
        .join("\n")
}
