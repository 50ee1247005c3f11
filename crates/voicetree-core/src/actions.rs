//! Tree actions and their application
//!
//! Every graph mutation flows through [`TreeAction`], a tagged sum type.
//! The applier processes a batch in order with per-action recovery: a bad
//! target skips that action, a bad parent degrades to an orphan create, and
//! the rest of the batch still lands.

use crate::error::TreeError;
use crate::node::NodeId;
use crate::tree::DecisionTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// A single mutation of the decision tree.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action")]
pub enum TreeAction {
    #[serde(rename = "APPEND")]
    Append { target_node_id: NodeId, content: String },

    #[serde(rename = "CREATE")]
    Create {
        parent_node_id: Option<NodeId>,
        new_node_name: String,
        content: String,
        summary: String,
        /// Edge phrase from the new node's perspective. Empty for orphans.
        relationship: String,
    },

    #[serde(rename = "UPDATE")]
    Update {
        node_id: NodeId,
        new_content: String,
        new_summary: String,
    },
}

/// Applies action batches to a [`DecisionTree`].
pub struct TreeActionApplier<'a> {
    tree: &'a mut DecisionTree,
}

impl<'a> TreeActionApplier<'a> {
    pub fn new(tree: &'a mut DecisionTree) -> Self {
        Self { tree }
    }

    /// Apply `actions` in order and return every node id that was created
    /// or mutated by an action that succeeded. For a create this includes
    /// the parent, whose child list changed.
    pub fn apply(&mut self, actions: &[TreeAction]) -> BTreeSet<NodeId> {
        let mut mutated = BTreeSet::new();

        for action in actions {
            match action {
                TreeAction::Append { target_node_id, content } => {
                    match self.tree.append_content(*target_node_id, content, content) {
                        Ok(()) => {
                            mutated.insert(*target_node_id);
                        }
                        Err(TreeError::UnknownNode(id)) => {
                            warn!("skipping APPEND to unknown node {}", id);
                        }
                        Err(e) => warn!("skipping APPEND: {}", e),
                    }
                }
                TreeAction::Create {
                    parent_node_id,
                    new_node_name,
                    content,
                    summary,
                    relationship,
                } => {
                    let existing_parent = parent_node_id.filter(|&pid| self.tree.contains(pid));
                    let new_id = self.tree.create_node(
                        new_node_name,
                        *parent_node_id,
                        content,
                        summary,
                        relationship,
                    );
                    mutated.insert(new_id);
                    if let Some(pid) = existing_parent {
                        mutated.insert(pid);
                    }
                }
                TreeAction::Update { node_id, new_content, new_summary } => {
                    match self.tree.update_node(*node_id, new_content, new_summary) {
                        Ok(()) => {
                            mutated.insert(*node_id);
                        }
                        Err(TreeError::UnknownNode(id)) => {
                            warn!("skipping UPDATE of unknown node {}", id);
                        }
                        Err(e) => warn!("skipping UPDATE: {}", e),
                    }
                }
            }
        }

        mutated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_tag_roundtrip() {
        let action = TreeAction::Append { target_node_id: 3, content: "x".into() };
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains(r#""action":"APPEND""#));
        let back: TreeAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn apply_reports_only_successful_targets() {
        let mut tree = DecisionTree::new();
        let existing = tree.create_node("A", None, "a", "s", "");

        let actions = vec![
            TreeAction::Append { target_node_id: existing, content: "more".into() },
            TreeAction::Append { target_node_id: 999, content: "lost".into() },
            TreeAction::Update {
                node_id: 998,
                new_content: "x".into(),
                new_summary: "y".into(),
            },
        ];
        let mutated = TreeActionApplier::new(&mut tree).apply(&actions);
        assert_eq!(mutated.into_iter().collect::<Vec<_>>(), vec![existing]);
        assert_eq!(tree.get(existing).unwrap().content, "a\nmore");
    }

    #[test]
    fn create_reports_child_and_parent() {
        let mut tree = DecisionTree::new();
        let parent = tree.create_node("P", None, "p", "s", "");
        let actions = vec![TreeAction::Create {
            parent_node_id: Some(parent),
            new_node_name: "C".into(),
            content: "c".into(),
            summary: "cs".into(),
            relationship: "subtask of".into(),
        }];
        let mutated = TreeActionApplier::new(&mut tree).apply(&actions);
        let child = *mutated.iter().max().unwrap();
        assert!(mutated.contains(&parent));
        assert_eq!(tree.get(parent).unwrap().children, vec![child]);
    }

    #[test]
    fn create_with_missing_parent_degrades_and_reports_only_child() {
        let mut tree = DecisionTree::new();
        let actions = vec![TreeAction::Create {
            parent_node_id: Some(77),
            new_node_name: "C".into(),
            content: "c".into(),
            summary: "cs".into(),
            relationship: "subtask of".into(),
        }];
        let mutated = TreeActionApplier::new(&mut tree).apply(&actions);
        assert_eq!(mutated.len(), 1);
        let id = *mutated.iter().next().unwrap();
        assert_eq!(tree.get(id).unwrap().parent_id, None);
    }

    #[test]
    fn duplicate_names_under_same_parent_both_created() {
        let mut tree = DecisionTree::new();
        let parent = tree.create_node("P", None, "p", "s", "");
        let make = |tree: &mut DecisionTree| {
            TreeActionApplier::new(tree).apply(&[TreeAction::Create {
                parent_node_id: Some(parent),
                new_node_name: "Dup".into(),
                content: "c".into(),
                summary: "cs".into(),
                relationship: "part of".into(),
            }])
        };
        make(&mut tree);
        make(&mut tree);
        assert_eq!(tree.get(parent).unwrap().children.len(), 2);
    }
}
