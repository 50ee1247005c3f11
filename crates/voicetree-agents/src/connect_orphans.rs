//! Maintenance: group disconnected roots under new parents
//!
//! Dictation grows the forest one orphan at a time; related themes end up
//! as separate roots. Off the hot path, this agent shows the LLM every
//! current root (titles, summaries, child overviews) and asks for obvious
//! groupings. Each grouping becomes a CREATE for a new parent root.

use crate::models::{connect_orphans_schema, ConnectOrphansResponse};
use crate::prompts::{render, CONNECT_ORPHANS_PROMPT};
use std::sync::Arc;
use tracing::{info, warn};
use voicetree_core::{DecisionTree, Node, NodeId, TreeAction};
use voicetree_llm::{call_structured, LlmProvider, LlmRequest, LlmResult, RetryConfig};

pub const DEFAULT_MIN_GROUP_SIZE: usize = 2;
pub const DEFAULT_MAX_ROOTS: usize = 20;

const CHILD_PREVIEW_LIMIT: usize = 5;

pub struct ConnectOrphansAgent {
    provider: Arc<dyn LlmProvider>,
    model: String,
    retry: RetryConfig,
}

impl ConnectOrphansAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Propose parents for related roots. Returns an empty list when there
    /// are too few roots or the LLM finds no obvious groupings.
    pub async fn run(
        &self,
        tree: &DecisionTree,
        min_group_size: usize,
        max_roots: usize,
    ) -> LlmResult<Vec<TreeAction>> {
        let mut root_ids = tree.root_ids();
        if root_ids.len() < min_group_size {
            info!("not enough disconnected roots to group");
            return Ok(Vec::new());
        }
        if root_ids.len() > max_roots {
            warn!("found {} roots, limiting to {}", root_ids.len(), max_roots);
            root_ids.truncate(max_roots);
        }

        let roots: Vec<&Node> = root_ids.iter().filter_map(|id| tree.get(*id)).collect();
        let roots_context = format_roots(&roots, tree);
        let min_group = min_group_size.to_string();

        let response: ConnectOrphansResponse = call_structured(
            self.provider.as_ref(),
            LlmRequest::new(
                &self.model,
                render(
                    CONNECT_ORPHANS_PROMPT,
                    &[
                        ("roots_context", roots_context.as_str()),
                        ("min_group_size", min_group.as_str()),
                    ],
                ),
            )
            .with_schema(connect_orphans_schema()),
            &self.retry,
        )
        .await?;

        let mut actions = Vec::new();
        for grouping in &response.groupings {
            if grouping.root_node_titles.len() < min_group_size {
                warn!(
                    "dropping grouping {:?}: fewer than {} members",
                    grouping.parent_title, min_group_size
                );
                continue;
            }
            let member_ids = map_titles_to_ids(&grouping.root_node_titles, &roots);
            info!(
                "creating parent {:?} for roots {:?} (ids {:?})",
                grouping.parent_title, grouping.root_node_titles, member_ids
            );
            actions.push(TreeAction::Create {
                parent_node_id: None,
                new_node_name: grouping.parent_title.clone(),
                content: format!("# {}\n\n{}", grouping.parent_title, grouping.parent_summary),
                summary: grouping.parent_summary.clone(),
                relationship: String::new(),
            });
        }

        Ok(actions)
    }
}

fn format_roots(roots: &[&Node], tree: &DecisionTree) -> String {
    roots
        .iter()
        .map(|root| {
            let mut block = format!("Title: {}\n", root.title);
            let summary = if root.summary.is_empty() {
                root.content.chars().take(200).collect::<String>()
            } else {
                root.summary.clone()
            };
            block.push_str(&format!("Summary: {}\n", summary));

            if root.children.is_empty() {
                block.push_str("Has no children (leaf node)\n");
            } else {
                block.push_str(&format!("Has {} children:\n", root.children.len()));
                for (i, child_id) in root.children.iter().take(CHILD_PREVIEW_LIMIT).enumerate() {
                    if let Some(child) = tree.get(*child_id) {
                        let gloss: String = child.summary.chars().take(50).collect();
                        block.push_str(&format!("  {}. {}: {}...\n", i + 1, child.title, gloss));
                    }
                }
                if root.children.len() > CHILD_PREVIEW_LIMIT {
                    block.push_str(&format!(
                        "  ... and {} more children\n",
                        root.children.len() - CHILD_PREVIEW_LIMIT
                    ));
                }
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Map grouping titles back to root ids, tolerating near-miss titles with a
/// case-insensitive containment fallback.
fn map_titles_to_ids(titles: &[String], roots: &[&Node]) -> Vec<NodeId> {
    let mut ids = Vec::new();
    for title in titles {
        if let Some(root) = roots.iter().find(|r| &r.title == title) {
            ids.push(root.id);
            continue;
        }
        let lower = title.to_lowercase();
        if let Some(root) = roots.iter().find(|r| {
            let root_lower = r.title.to_lowercase();
            lower.contains(&root_lower) || root_lower.contains(&lower)
        }) {
            info!("fuzzy matched grouping title {:?} to {:?}", title, root.title);
            ids.push(root.id);
        } else {
            warn!("grouping title {:?} matches no root", title);
        }
    }
    ids
}
