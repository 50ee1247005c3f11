//! Markdown to tree
//!
//! Rebuilds a [`DecisionTree`] from a vault directory. Two passes: parse
//! every file into a node, then resolve `_Links:_` sections into edges.
//! Child order comes from the parent file's own link lines, so insertion
//! order survives the round trip.

use crate::{MarkdownError, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};
use voicetree_core::{DecisionTree, Node, NodeId};

#[derive(Deserialize)]
struct FrontmatterRaw {
    title: String,
    node_id: NodeId,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    modified_at: Option<String>,
}

struct ParsedFile {
    node: Node,
    /// `(child_filename, relationship)` in file order.
    child_links: Vec<(String, String)>,
    /// `(parent_filename, relationship)`.
    parent_link: Option<(String, String)>,
}

fn child_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^- parent_of \[\[(.+?)\]\] \((.+?) this node\)$").expect("valid regex")
    })
}

fn parent_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^- (\S+) \[\[(.+?)\]\]$").expect("valid regex"))
}

/// Load every `*.md` file under `dir` into a tree.
pub fn load_tree(dir: impl AsRef<Path>) -> Result<DecisionTree> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(MarkdownError::MissingVault(dir.display().to_string()));
    }

    let mut filenames: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".md"))
        .collect();
    filenames.sort();

    let mut parsed: Vec<ParsedFile> = Vec::new();
    for filename in &filenames {
        let raw = fs::read_to_string(dir.join(filename))?;
        match parse_file(filename, &raw) {
            Some(file) => parsed.push(file),
            None => warn!("skipping unparseable vault file {}", filename),
        }
    }

    let filename_to_id: HashMap<String, NodeId> = parsed
        .iter()
        .map(|p| (p.node.filename.clone(), p.node.id))
        .collect();

    let mut nodes: HashMap<NodeId, Node> = parsed
        .iter()
        .map(|p| (p.node.id, p.node.clone()))
        .collect();

    // Edges. Child lines carry order and the child's relationship phrase;
    // parent lines fill in anything a missing parent file left dangling.
    for file in &parsed {
        let parent_id = file.node.id;
        for (child_filename, relationship) in &file.child_links {
            let Some(&child_id) = filename_to_id.get(child_filename) else {
                warn!("link to unknown file {} ignored", child_filename);
                continue;
            };
            attach(&mut nodes, parent_id, child_id, relationship);
        }
        if let Some((parent_filename, relationship)) = &file.parent_link {
            let Some(&pid) = filename_to_id.get(parent_filename) else {
                warn!("link to unknown file {} ignored", parent_filename);
                continue;
            };
            attach(&mut nodes, pid, file.node.id, relationship);
        }
    }

    let mut tree = DecisionTree::new();
    let mut ids: Vec<NodeId> = nodes.keys().copied().collect();
    ids.sort_unstable();
    for id in ids {
        if let Some(node) = nodes.remove(&id) {
            tree.insert(node);
        }
    }

    info!("loaded {} nodes from {}", tree.node_count(), dir.display());
    Ok(tree)
}

fn attach(nodes: &mut HashMap<NodeId, Node>, parent_id: NodeId, child_id: NodeId, relationship: &str) {
    let phrase = relationship.replace('_', " ");
    if let Some(child) = nodes.get_mut(&child_id) {
        if child.parent_id.is_some() {
            return;
        }
        child.parent_id = Some(parent_id);
        child.relationships.insert(parent_id, phrase);
    }
    if let Some(parent) = nodes.get_mut(&parent_id) {
        if !parent.children.contains(&child_id) {
            parent.children.push(child_id);
        }
    }
}

fn parse_file(filename: &str, raw: &str) -> Option<ParsedFile> {
    let rest = raw.strip_prefix("---\n")?;
    let end = rest.find("\n---\n")?;
    let frontmatter: FrontmatterRaw = match serde_yaml::from_str(&rest[..end]) {
        Ok(f) => f,
        Err(e) => {
            warn!("bad frontmatter in {}: {}", filename, e);
            return None;
        }
    };
    let body = &rest[end + 5..];

    let title = strip_id_suffix(&frontmatter.title, frontmatter.node_id);
    let (summary, content, links_section) = split_body(body);

    let mut node = Node::new(title, frontmatter.node_id, content, summary, None);
    node.filename = filename.to_string();
    node.tags = frontmatter.tags;
    node.color = frontmatter.color;
    if let Some(ts) = parse_timestamp(frontmatter.created_at.as_deref()) {
        node.created_at = ts;
    }
    if let Some(ts) = parse_timestamp(frontmatter.modified_at.as_deref()) {
        node.modified_at = ts;
    }

    let mut child_links = Vec::new();
    let mut parent_link = None;
    for line in links_section.lines() {
        let line = line.trim();
        if let Some(caps) = child_link_re().captures(line) {
            child_links.push((caps[1].to_string(), caps[2].to_string()));
        } else if let Some(caps) = parent_link_re().captures(line) {
            parent_link = Some((caps[2].to_string(), caps[1].to_string()));
        }
    }

    Some(ParsedFile { node, child_links, parent_link })
}

/// The frontmatter title carries an ` (<id>)` suffix for readability in
/// vault browsers; strip it back off.
fn strip_id_suffix(title: &str, id: NodeId) -> String {
    let suffix = format!(" ({})", id);
    title
        .strip_suffix(&suffix)
        .unwrap_or(title)
        .to_string()
}

/// Split a file body into (summary, content, links section).
fn split_body(body: &str) -> (String, String, String) {
    let (main, links) = match body.find("-----------------") {
        Some(pos) => {
            let after = &body[pos..];
            let links = after
                .find("_Links:_")
                .map(|l| after[l + "_Links:_".len()..].to_string())
                .unwrap_or_default();
            (&body[..pos], links)
        }
        None => (body, String::new()),
    };

    let mut summary = String::new();
    let mut content_lines = Vec::new();
    let mut found_summary = false;
    for line in main.lines() {
        let trimmed = line.trim();
        if !found_summary && trimmed.starts_with("###") {
            summary = trimmed.trim_start_matches('#').trim().to_string();
            found_summary = true;
            continue;
        }
        content_lines.push(line);
    }

    let content = content_lines.join("\n").trim().to_string();
    (summary, content, links)
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
