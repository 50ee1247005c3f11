//! Tree to markdown
//!
//! One file per node, named `<id>_<slug>.md`. Writes are atomic at the
//! per-file level: the handle is scoped, flushed and fsync'd before close
//! on every path, so a crash never leaves a torn vault entry.

use crate::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use voicetree_core::{DecisionTree, Node, NodeId};

#[derive(Serialize)]
struct Frontmatter {
    title: String,
    node_id: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
    created_at: String,
    modified_at: String,
}

pub struct MarkdownWriter {
    output_dir: PathBuf,
}

impl MarkdownWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write (or rewrite) the files for `node_ids`. A failure on one node
    /// is logged and does not block the rest of the batch.
    pub fn write_nodes(&self, tree: &DecisionTree, node_ids: &BTreeSet<NodeId>) -> Result<()> {
        if node_ids.is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.output_dir)?;
        info!("writing markdown for nodes {:?}", node_ids);

        for &node_id in node_ids {
            let node = match tree.get(node_id) {
                Some(node) => node,
                None => {
                    error!("cannot write markdown for unknown node {}", node_id);
                    continue;
                }
            };
            if let Err(e) = self.write_node(tree, node) {
                error!("failed to write markdown for node {}: {}", node_id, e);
            }
        }
        Ok(())
    }

    fn write_node(&self, tree: &DecisionTree, node: &Node) -> Result<()> {
        let path = self.output_dir.join(&node.filename);
        let body = render_node(tree, node)?;

        let mut file = File::create(&path)?;
        file.write_all(body.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}

fn render_node(tree: &DecisionTree, node: &Node) -> Result<String> {
    let frontmatter = Frontmatter {
        title: format!("{} ({})", node.title, node.id),
        node_id: node.id,
        color: node.color.clone(),
        tags: node.tags.clone(),
        created_at: node.created_at.to_rfc3339(),
        modified_at: node.modified_at.to_rfc3339(),
    };
    let yaml = serde_yaml::to_string(&frontmatter)?;

    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&yaml);
    out.push_str("---\n");

    // A summary header, unless the content already carries its own.
    if !node.summary.is_empty() && !node.content.contains("###") {
        out.push_str(&format!("### {}\n\n", node.summary));
    }
    out.push_str(&node.content);
    out.push_str("\n\n\n-----------------\n_Links:_\n");

    for &child_id in &node.children {
        if let Some(child) = tree.get(child_id) {
            let rel = child
                .relationships
                .get(&node.id)
                .map(String::as_str)
                .unwrap_or("child of");
            out.push_str(&format!(
                "- parent_of [[{}]] ({} this node)\n",
                child.filename,
                snake_case(rel)
            ));
        }
    }

    if let Some(parent_id) = node.parent_id {
        if let Some(parent) = tree.get(parent_id) {
            let rel = node
                .relationships
                .get(&parent_id)
                .map(String::as_str)
                .unwrap_or("child of");
            out.push_str(&format!("- {} [[{}]]\n", snake_case(rel), parent.filename));
        }
    }

    Ok(out)
}

/// Relationship phrases are rendered with underscores so a phrase can never
/// be confused with link syntax.
pub fn snake_case(phrase: &str) -> String {
    phrase.split_whitespace().collect::<Vec<_>>().join("_")
}
