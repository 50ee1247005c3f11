//! Phase 2: single-abstraction optimisation
//!
//! Runs once per mutated node per cycle, on a read-only snapshot of the
//! tree. May rewrite the node (UPDATE) or split a sub-idea into a child
//! (CREATE with this node as parent). An empty action list means the node
//! is already a single clean abstraction.

use crate::models::{optimization_schema, OptimizationKind, OptimizationResponse};
use crate::prompts::{render, OPTIMIZER_PROMPT};
use std::sync::Arc;
use tracing::{debug, warn};
use voicetree_core::{DecisionTree, Neighbor, NodeId, TreeAction};
use voicetree_llm::{call_structured, LlmProvider, LlmRequest, LlmResult, RetryConfig};

pub struct SingleAbstractionOptimizerAgent {
    provider: Arc<dyn LlmProvider>,
    model: String,
    retry: RetryConfig,
}

impl SingleAbstractionOptimizerAgent {
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

    /// Inspect `node_id` in `tree` (a snapshot) and propose corrections.
    pub async fn run(&self, node_id: NodeId, tree: &DecisionTree) -> LlmResult<Vec<TreeAction>> {
        let node = match tree.get(node_id) {
            Some(node) => node,
            None => {
                warn!("optimizer asked about unknown node {}", node_id);
                return Ok(Vec::new());
            }
        };
        let neighbors = tree.get_neighbors(node_id).unwrap_or_default();

        let prompt = render(
            OPTIMIZER_PROMPT,
            &[
                ("node_id", node_id.to_string().as_str()),
                ("title", node.title.as_str()),
                ("summary", node.summary.as_str()),
                ("content", node.content.as_str()),
                ("neighbors", format_neighbors(&neighbors).as_str()),
            ],
        );

        let response: OptimizationResponse = call_structured(
            self.provider.as_ref(),
            LlmRequest::new(&self.model, prompt).with_schema(optimization_schema()),
            &self.retry,
        )
        .await?;

        debug!(
            "optimizer on node {}: {} actions ({})",
            node_id,
            response.actions.len(),
            response.reasoning
        );

        let mut actions = Vec::new();
        for decision in response.actions {
            match decision.action {
                OptimizationKind::Update => {
                    match (decision.new_content, decision.new_summary) {
                        (Some(new_content), Some(new_summary)) => {
                            actions.push(TreeAction::Update { node_id, new_content, new_summary });
                        }
                        _ => warn!("optimizer UPDATE missing content or summary, skipping"),
                    }
                }
                OptimizationKind::Create => {
                    match (decision.new_node_name, decision.content) {
                        (Some(new_node_name), Some(content)) => {
                            // Splits always hang off the node being optimised.
                            actions.push(TreeAction::Create {
                                parent_node_id: Some(node_id),
                                new_node_name,
                                content,
                                summary: decision.summary.unwrap_or_default(),
                                relationship: decision
                                    .relationship
                                    .unwrap_or_else(|| "subtask of".to_string()),
                            });
                        }
                        _ => warn!("optimizer CREATE missing name or content, skipping"),
                    }
                }
            }
        }

        Ok(actions)
    }
}

fn format_neighbors(neighbors: &[Neighbor]) -> String {
    if neighbors.is_empty() {
        return "No neighbors".to_string();
    }
    neighbors
        .iter()
        .map(|n| format!("- [{:?}] {} (id {}): {}", n.relationship, n.name, n.id, n.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicetree_llm::MockProvider;

    fn agent_with(responses: &[&str]) -> SingleAbstractionOptimizerAgent {
        let mock = MockProvider::new();
        for r in responses {
            mock.push_response(*r);
        }
        SingleAbstractionOptimizerAgent::new(Arc::new(mock), "test-model")
    }

    fn small_tree() -> DecisionTree {
        let mut tree = DecisionTree::new();
        tree.create_node("Mixed Node", None, "idea one. idea two.", "two ideas", "");
        tree
    }

    #[tokio::test]
    async fn empty_actions_means_clean_node() {
        let agent = agent_with(&[r#"{"reasoning": "atomic", "actions": []}"#]);
        let actions = agent.run(1, &small_tree()).await.unwrap();
        assert!(actions.is_empty());
    }

    #[tokio::test]
    async fn split_is_parented_to_optimised_node() {
        let agent = agent_with(&[r#"{
            "reasoning": "two ideas",
            "actions": [
                {"action": "UPDATE", "new_content": "idea one.", "new_summary": "one idea"},
                {"action": "CREATE", "new_node_name": "Idea Two", "content": "idea two.",
                 "summary": "the second idea", "relationship": "subtopic of"}
            ]
        }"#]);
        let actions = agent.run(1, &small_tree()).await.unwrap();
        assert_eq!(actions.len(), 2);
        match &actions[1] {
            TreeAction::Create { parent_node_id, .. } => assert_eq!(*parent_node_id, Some(1)),
            other => panic!("expected create, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_node_yields_no_actions_without_llm_call() {
        let mock = Arc::new(MockProvider::new());
        let agent = SingleAbstractionOptimizerAgent::new(mock.clone(), "test-model");
        let actions = agent.run(99, &DecisionTree::new()).await.unwrap();
        assert!(actions.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn malformed_decisions_are_skipped() {
        let agent = agent_with(&[r#"{
            "reasoning": "partial",
            "actions": [{"action": "UPDATE", "new_content": "only content"}]
        }"#]);
        let actions = agent.run(1, &small_tree()).await.unwrap();
        assert!(actions.is_empty());
    }
}
