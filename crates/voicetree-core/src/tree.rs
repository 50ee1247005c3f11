//! In-memory decision tree
//!
//! A forest of nodes in a flat `id -> Node` arena. Relationships are stored
//! by id, never by pointer, so deep-copying for read-only snapshots is a
//! plain `clone`. Single-writer: all mutation goes through the methods here.

use crate::error::{Result, TreeError};
use crate::node::{extract_summary, Node, NodeId};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Relation of a neighbor to the queried node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborRelation {
    Parent,
    Sibling,
    Child,
}

/// One-hop neighborhood entry returned by [`DecisionTree::get_neighbors`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: NodeId,
    pub name: String,
    pub summary: String,
    pub relationship: NeighborRelation,
}

#[derive(Clone, Debug)]
pub struct DecisionTree {
    nodes: HashMap<NodeId, Node>,
    next_node_id: NodeId,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_node_id: 1,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn next_id(&self) -> NodeId {
        self.next_node_id
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }

    /// Ids of every root (parentless) node, ascending.
    pub fn root_ids(&self) -> Vec<NodeId> {
        let mut roots: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.parent_id.is_none())
            .map(|n| n.id)
            .collect();
        roots.sort_unstable();
        roots
    }

    /// Insert a pre-built node, e.g. when loading a vault from disk.
    /// Keeps id assignment monotone past the highest inserted id.
    pub fn insert(&mut self, node: Node) {
        self.next_node_id = self.next_node_id.max(node.id + 1);
        self.nodes.insert(node.id, node);
    }

    /// Create a node, optionally attached to a parent. A missing parent is
    /// not an error: the node degrades to an orphan and the incident is
    /// logged.
    pub fn create_node(
        &mut self,
        name: impl Into<String>,
        parent_node_id: Option<NodeId>,
        content: impl Into<String>,
        summary: impl Into<String>,
        relationship: impl Into<String>,
    ) -> NodeId {
        let name = name.into();
        let content = content.into();
        let summary = summary.into();

        let parent_node_id = match parent_node_id {
            Some(pid) if !self.nodes.contains_key(&pid) => {
                warn!("create_node {:?}: parent {} does not exist, creating orphan", name, pid);
                None
            }
            other => other,
        };

        let new_id = self.next_node_id;
        let mut node = Node::new(&name, new_id, content, summary, parent_node_id);
        if node.summary.is_empty() {
            node.summary = extract_summary(&node.content);
        }
        if let Some(pid) = parent_node_id {
            node.relationships.insert(pid, relationship.into());
        }
        self.nodes.insert(new_id, node);
        if let Some(pid) = parent_node_id {
            if let Some(parent) = self.nodes.get_mut(&pid) {
                parent.children.push(new_id);
                parent.modified_at = Utc::now();
            }
        }
        self.next_node_id += 1;

        debug!("created node {} ({:?}), parent={:?}", new_id, name, parent_node_id);
        new_id
    }

    /// Append content to a node. The summary is left untouched; only an
    /// explicit update may change it.
    pub fn append_content(
        &mut self,
        node_id: NodeId,
        new_content: &str,
        transcript: &str,
    ) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(TreeError::UnknownNode(node_id))?;
        node.content.push('\n');
        node.content.push_str(new_content);
        if !transcript.is_empty() {
            node.transcript_history.push_str(transcript);
            node.transcript_history.push_str("... ");
        }
        node.modified_at = Utc::now();
        node.num_appends += 1;
        Ok(())
    }

    /// Replace a node's content and summary atomically.
    pub fn update_node(&mut self, node_id: NodeId, content: &str, summary: &str) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(TreeError::UnknownNode(node_id))?;
        node.content = content.to_string();
        node.summary = summary.to_string();
        node.modified_at = Utc::now();
        Ok(())
    }

    /// Find a node by title: case-insensitive exact match first, then the
    /// best fuzzy match at or above `similarity_threshold`.
    pub fn find_node_by_name(&self, name: &str, similarity_threshold: f64) -> Option<NodeId> {
        if name.is_empty() || self.nodes.is_empty() {
            return None;
        }
        let needle = name.to_lowercase();

        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();

        for &id in &ids {
            if self.nodes[&id].title.to_lowercase() == needle {
                return Some(id);
            }
        }

        let mut best: Option<(NodeId, f64)> = None;
        for &id in &ids {
            let score = strsim::sorensen_dice(&needle, &self.nodes[&id].title.to_lowercase());
            if score >= similarity_threshold && best.map_or(true, |(_, b)| score > b) {
                best = Some((id, score));
            }
        }
        if let Some((id, score)) = best {
            info!(
                "fuzzy matched {:?} to {:?} (id {}, score {:.2})",
                name, self.nodes[&id].title, id, score
            );
        }
        best.map(|(id, _)| id)
    }

    /// Immediate one-hop neighborhood: parent, siblings, then children.
    pub fn get_neighbors(&self, node_id: NodeId) -> Result<Vec<Neighbor>> {
        let node = self.nodes.get(&node_id).ok_or(TreeError::UnknownNode(node_id))?;
        let mut neighbors = Vec::new();

        if let Some(pid) = node.parent_id {
            if let Some(parent) = self.nodes.get(&pid) {
                neighbors.push(Neighbor {
                    id: pid,
                    name: parent.title.clone(),
                    summary: parent.summary.clone(),
                    relationship: NeighborRelation::Parent,
                });
                for &sibling_id in &parent.children {
                    if sibling_id == node_id {
                        continue;
                    }
                    if let Some(sibling) = self.nodes.get(&sibling_id) {
                        neighbors.push(Neighbor {
                            id: sibling_id,
                            name: sibling.title.clone(),
                            summary: sibling.summary.clone(),
                            relationship: NeighborRelation::Sibling,
                        });
                    }
                }
            }
        }

        for &child_id in &node.children {
            if let Some(child) = self.nodes.get(&child_id) {
                neighbors.push(Neighbor {
                    id: child_id,
                    name: child.title.clone(),
                    summary: child.summary.clone(),
                    relationship: NeighborRelation::Child,
                });
            }
        }

        Ok(neighbors)
    }

    /// Ids of the most recently modified nodes, newest first.
    pub fn get_recent_nodes(&self, num_nodes: usize) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_by(|a, b| {
            self.nodes[b]
                .modified_at
                .cmp(&self.nodes[a].modified_at)
                .then(a.cmp(b))
        });
        ids.truncate(num_nodes);
        ids
    }

    /// Ids ordered by child count, descending.
    pub fn get_nodes_by_branching_factor(&self, limit: Option<usize>) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort_by(|a, b| {
            self.nodes[b]
                .children
                .len()
                .cmp(&self.nodes[a].children.len())
                .then(a.cmp(b))
        });
        if let Some(limit) = limit {
            ids.truncate(limit);
        }
        ids
    }
}
