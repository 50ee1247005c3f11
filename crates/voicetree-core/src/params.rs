//! Parameter extraction for formula-style utterances
//!
//! Dictated word problems define quantities in terms of other quantities
//! ("the number of adult owls in X equals ..."). When a query contains
//! `equals`, the nodes defining the parameters on its right-hand side are
//! the ones the speaker depends on, regardless of lexical overlap.

use regex::Regex;
use std::sync::OnceLock;

fn pattern_newborn() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"average number of newborn children per adult (\w+(?:\s+\w+)*) in (\w+(?:\s+\w+)*)")
            .expect("valid regex")
    })
}

fn pattern_adult() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"number of adult (\w+(?:\s+\w+)*) in (\w+(?:\s+\w+)*)").expect("valid regex")
    })
}

fn pattern_total() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"total number of adult animals in (\w+(?:\s+\w+)*)").expect("valid regex")
    })
}

fn snake(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Extract every normalized parameter mentioned in `text`.
pub fn extract_parameters(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut params = Vec::new();

    for caps in pattern_newborn().captures_iter(&lower) {
        params.push(format!("avg_newborn_{}_{}", snake(&caps[1]), snake(&caps[2])));
    }
    for caps in pattern_adult().captures_iter(&lower) {
        params.push(format!("adult_{}_{}", snake(&caps[1]), snake(&caps[2])));
    }
    for caps in pattern_total().captures_iter(&lower) {
        params.push(format!("total_adults_{}", snake(&caps[1])));
    }

    params
}

/// The parameter a node defines: the left-hand side of its `equals`, if any.
pub fn extract_defined_parameter(node_text: &str) -> Option<String> {
    let lower = node_text.to_lowercase();
    let lhs = lower.split("equals").next()?;
    if lhs.len() == lower.len() {
        // no "equals" present
        return None;
    }
    extract_parameters(lhs).into_iter().next()
}

/// Parameters listed under a node's `_Defines:_` metadata section.
pub fn extract_defined_parameters_from_metadata(node_content: &str) -> Vec<String> {
    if !node_content.contains("_Defines:") {
        return Vec::new();
    }
    let mut defines = Vec::new();
    let mut in_section = false;
    for line in node_content.lines() {
        let line = line.trim();
        if line == "_Defines:" {
            in_section = true;
            continue;
        }
        if in_section && (line.starts_with('_') || line == "_Links:") {
            break;
        }
        if in_section {
            if let Some(item) = line.strip_prefix("- ") {
                let item = item.trim();
                if !item.is_empty() {
                    defines.push(item.to_string());
                }
            }
        }
    }
    defines
}

/// Parameters a query needs: everything on the right-hand side of its
/// `equals`, or every parameter mentioned when there is no `equals`.
pub fn extract_needed_parameters(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    match lower.split_once("equals") {
        Some((_, rhs)) => extract_parameters(rhs),
        None => extract_parameters(&lower),
    }
}
