//! Phase 1: place transcript segments into the tree
//!
//! Two LLM calls per flushed buffer: segmentation into atomic ideas, then
//! placement of each complete segment as an APPEND to a shown node or a
//! CREATE. The agent never mutates the tree; it returns actions for the
//! applier.

use crate::models::{
    placement_schema, segmentation_schema, AppendAgentResult, PlacementDecision, PlacementKind,
    PlacementResponse, SegmentationResponse,
};
use crate::prompts::{render, PLACEMENT_PROMPT, SEGMENTATION_PROMPT};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use voicetree_core::context::{format_nodes_for_prompt, get_most_relevant_nodes};
use voicetree_core::{DecisionTree, NodeId, TreeAction};
use voicetree_llm::{call_structured, LlmProvider, LlmRequest, LlmResult, RetryConfig};

pub struct AppendToRelevantNodeAgent {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_context_nodes: usize,
    retry: RetryConfig,
}

impl AppendToRelevantNodeAgent {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>, max_context_nodes: usize) -> Self {
        Self {
            provider,
            model: model.into(),
            max_context_nodes,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Segment `transcript_text` and produce one placement action per
    /// complete segment.
    pub async fn run(
        &self,
        transcript_text: &str,
        tree: &DecisionTree,
        transcript_history: &str,
    ) -> LlmResult<AppendAgentResult> {
        let segmentation: SegmentationResponse = call_structured(
            self.provider.as_ref(),
            LlmRequest::new(
                &self.model,
                render(
                    SEGMENTATION_PROMPT,
                    &[
                        ("transcript_history", transcript_history),
                        ("transcript_text", transcript_text),
                    ],
                ),
            )
            .with_schema(segmentation_schema()),
            &self.retry,
        )
        .await?;

        let segments = segmentation.segments;
        let complete: Vec<_> = segments.iter().filter(|s| s.is_complete).cloned().collect();
        debug!(
            "segmented into {} segments ({} complete)",
            segments.len(),
            complete.len()
        );

        if complete.is_empty() {
            return Ok(AppendAgentResult {
                actions: Vec::new(),
                segments,
                completed_text: String::new(),
            });
        }

        let context_nodes = get_most_relevant_nodes(tree, self.max_context_nodes, Some(transcript_text));
        let shown_ids: HashSet<NodeId> = context_nodes.iter().map(|n| n.id).collect();
        let existing_nodes = format_nodes_for_prompt(&context_nodes, tree);

        let segments_json = serde_json::to_string_pretty(&complete)
            .unwrap_or_else(|_| "[]".to_string());

        let placement: PlacementResponse = call_structured(
            self.provider.as_ref(),
            LlmRequest::new(
                &self.model,
                render(
                    PLACEMENT_PROMPT,
                    &[
                        ("existing_nodes", existing_nodes.as_str()),
                        ("transcript_history", transcript_history),
                        ("segments", segments_json.as_str()),
                    ],
                ),
            )
            .with_schema(placement_schema()),
            &self.retry,
        )
        .await?;

        let mut actions = Vec::with_capacity(complete.len());
        for (index, segment) in complete.iter().enumerate() {
            let decision = placement.placements.get(index);
            actions.push(place_segment(&segment.text, decision, &shown_ids));
        }

        let completed_text = complete
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(AppendAgentResult { actions, segments, completed_text })
    }
}

/// Resolve one segment's placement into a tree action, enforcing the
/// placement policies: exactly one action per segment, APPEND targets must
/// have been shown, CREATE content is the verbatim segment text.
fn place_segment(
    segment_text: &str,
    decision: Option<&PlacementDecision>,
    shown_ids: &HashSet<NodeId>,
) -> TreeAction {
    match decision {
        Some(d) if d.action == PlacementKind::Append => match d.target_node_id {
            Some(target) if shown_ids.contains(&target) => TreeAction::Append {
                target_node_id: target,
                content: segment_text.to_string(),
            },
            other => {
                warn!(
                    "append target {:?} not in context projection, demoting to orphan create",
                    other
                );
                orphan_create(segment_text, d)
            }
        },
        Some(d) => {
            let parent = d.parent_node_id.filter(|pid| {
                let shown = shown_ids.contains(pid);
                if !shown {
                    warn!("create parent {} not in context projection, creating orphan", pid);
                }
                shown
            });
            TreeAction::Create {
                parent_node_id: parent,
                new_node_name: d
                    .new_node_name
                    .clone()
                    .unwrap_or_else(|| derive_node_name(segment_text)),
                content: segment_text.to_string(),
                summary: d.summary.clone().unwrap_or_default(),
                relationship: if parent.is_some() {
                    d.relationship.clone().unwrap_or_else(|| "child of".to_string())
                } else {
                    String::new()
                },
            }
        }
        None => {
            warn!("no placement returned for segment, creating orphan");
            TreeAction::Create {
                parent_node_id: None,
                new_node_name: derive_node_name(segment_text),
                content: segment_text.to_string(),
                summary: String::new(),
                relationship: String::new(),
            }
        }
    }
}

fn orphan_create(segment_text: &str, decision: &PlacementDecision) -> TreeAction {
    TreeAction::Create {
        parent_node_id: None,
        new_node_name: decision
            .new_node_name
            .clone()
            .unwrap_or_else(|| derive_node_name(segment_text)),
        content: segment_text.to_string(),
        summary: decision.summary.clone().unwrap_or_default(),
        relationship: String::new(),
    }
}

/// Fallback node name: the segment's first few words.
fn derive_node_name(text: &str) -> String {
    let name: Vec<&str> = text.split_whitespace().take(5).collect();
    let name = name.join(" ");
    let name = name.trim_end_matches(['.', ',', '!', '?', ';', ':']);
    if name.is_empty() {
        "Voice Input".to_string()
    } else {
        name.to_string()
    }
}
