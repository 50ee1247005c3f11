//! Node record and derived metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node identifier. Assigned monotonically, never reused.
pub type NodeId = u32;

/// A vertex of the knowledge forest. Corresponds 1:1 to a markdown file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    /// Markdown body. Grows via appends; replaced only by an explicit update.
    pub content: String,
    /// One-sentence gloss used in prompts.
    pub summary: String,
    pub parent_id: Option<NodeId>,
    /// Child ids in insertion order.
    pub children: Vec<NodeId>,
    /// Edge phrases keyed by the other node's id, from this node's perspective.
    pub relationships: HashMap<NodeId, String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub num_appends: u32,
    /// Source transcript fragments that produced this node, `"... "`-joined.
    pub transcript_history: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Markdown filename, fixed at creation for the lifetime of the node.
    pub filename: String,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        node_id: NodeId,
        content: impl Into<String>,
        summary: impl Into<String>,
        parent_id: Option<NodeId>,
    ) -> Self {
        let title = name.into();
        let now = Utc::now();
        Self {
            id: node_id,
            filename: filename_for(node_id, &title),
            title,
            content: content.into(),
            summary: summary.into(),
            parent_id,
            children: Vec::new(),
            relationships: HashMap::new(),
            created_at: now,
            modified_at: now,
            num_appends: 0,
            transcript_history: String::new(),
            tags: Vec::new(),
            color: None,
        }
    }
}

/// Deterministic markdown filename for a node.
pub fn filename_for(id: NodeId, title: &str) -> String {
    format!("{}_{}.md", id, slugify(title))
}

/// Reduce a title to a filename-safe slug. Runs of disallowed characters
/// collapse to a single underscore; `[A-Za-z0-9._-]` pass through.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_sep = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        "untitled".to_string()
    } else {
        out
    }
}

/// Best-effort one-line summary from markdown content. Used when a CREATE
/// arrives without a summary.
pub fn extract_summary(content: &str) -> String {
    if content.trim().is_empty() {
        return "Empty content".to_string();
    }

    // Bold span first
    if let Some(start) = content.find("**") {
        if let Some(len) = content[start + 2..].find("**") {
            let candidate = content[start + 2..start + 2 + len].trim();
            if candidate.len() > 3 {
                return candidate.to_string();
            }
        }
    }

    // Then a markdown header
    for line in content.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('#') {
            let candidate = rest.trim_start_matches('#').trim();
            if candidate.len() > 3 {
                return candidate.to_string();
            }
        }
    }

    // First meaningful sentence
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('-') || line.len() <= 10 {
            continue;
        }
        if let Some(dot) = line.find('.') {
            let first_sentence = line[..dot].trim();
            if first_sentence.len() > 10 {
                return first_sentence.to_string();
            }
        }
        if line.chars().count() <= 60 {
            return line.to_string();
        }
        let head: String = line.chars().take(60).collect();
        return format!("{}...", head.trim());
    }

    // Last resort: first non-empty, non-structural line
    for line in content.lines() {
        let line = line.trim();
        if !line.is_empty() && !line.starts_with('#') && !line.starts_with('-') {
            let head: String = line.chars().take(50).collect();
            let mut s = head.trim().to_string();
            if line.chars().count() > 50 {
                s.push_str("...");
            }
            return s;
        }
    }

    "Content summary unavailable".to_string()
}
