//! Chunk-processing orchestrator
//!
//! Public entry point of the pipeline. Each `process_fragment` call runs
//! to completion before the next begins; LLM calls are the only suspension
//! points and every one is awaited in place. Phase-1 actions land before
//! any phase-2 action; phase-2 runs per mutated node in ascending id
//! order, each against a fresh snapshot of the tree.

use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use voicetree_agents::{
    AppendToRelevantNodeAgent, ConnectOrphansAgent, SingleAbstractionOptimizerAgent,
};
use voicetree_agents::connect_orphans::{DEFAULT_MAX_ROOTS, DEFAULT_MIN_GROUP_SIZE};
use voicetree_core::{DecisionTree, NodeId, TreeAction, TreeActionApplier, VoiceTreeConfig};
use voicetree_llm::{LlmError, LlmProvider};
use voicetree_markdown::MarkdownWriter;

use crate::buffer::BufferManager;
use crate::history::HistoryManager;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),
}

pub struct ChunkProcessor {
    tree: DecisionTree,
    buffer: BufferManager,
    history: HistoryManager,
    append_agent: AppendToRelevantNodeAgent,
    optimizer_agent: SingleAbstractionOptimizerAgent,
    connect_orphans_agent: ConnectOrphansAgent,
    writer: Option<MarkdownWriter>,
    config: VoiceTreeConfig,
    nodes_at_last_maintenance: usize,
}

impl ChunkProcessor {
    pub fn new(provider: Arc<dyn LlmProvider>, config: VoiceTreeConfig) -> Self {
        Self::with_tree(provider, config, DecisionTree::new())
    }

    /// Start from an existing tree, e.g. a vault reloaded from disk.
    pub fn with_tree(
        provider: Arc<dyn LlmProvider>,
        config: VoiceTreeConfig,
        tree: DecisionTree,
    ) -> Self {
        let append_agent = AppendToRelevantNodeAgent::new(
            provider.clone(),
            &config.llm_model,
            config.max_nodes_for_llm_context,
        );
        let optimizer_agent =
            SingleAbstractionOptimizerAgent::new(provider.clone(), &config.llm_model);
        let connect_orphans_agent = ConnectOrphansAgent::new(provider, &config.llm_model);
        let nodes_at_last_maintenance = tree.node_count();
        Self {
            buffer: BufferManager::new(config.buffer_size_threshold),
            history: HistoryManager::new(),
            tree,
            append_agent,
            optimizer_agent,
            connect_orphans_agent,
            writer: None,
            config,
            nodes_at_last_maintenance,
        }
    }

    /// Publish mutated nodes to a markdown vault after each cycle.
    pub fn with_writer(mut self, writer: MarkdownWriter) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Persist rolling history to a sidecar file.
    pub fn with_history_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.history = HistoryManager::with_file(path.into());
        self
    }

    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    pub fn buffer_contents(&self) -> &str {
        self.buffer.contents()
    }

    pub fn history_text(&self) -> &str {
        self.history.get(self.config.history_cap())
    }

    /// Feed one transcript fragment. Returns the actions applied this call
    /// (empty when the buffer is still filling). On LLM failure the cycle
    /// aborts and the error propagates; mutations already applied this
    /// cycle are retained, and no transcript is lost: a phase-1 failure
    /// puts the flushed text back into the buffer, and by the time phase 2
    /// runs the completed text is already in history and the incomplete
    /// tail back in the buffer.
    pub async fn process_fragment(&mut self, fragment: &str) -> Result<Vec<TreeAction>, PipelineError> {
        if fragment.trim().is_empty() {
            return Ok(Vec::new());
        }

        self.buffer.add(fragment);
        if !self.buffer.is_ready() {
            return Ok(Vec::new());
        }

        let text = self.buffer.flush();
        let history = self.history.get(self.config.history_cap()).to_string();
        debug!("processing cycle over {} chars", text.len());

        // Phase 1: segment and place.
        let result = match self.append_agent.run(&text, &self.tree, &history).await {
            Ok(result) => result,
            Err(e) => {
                self.buffer.reinject(&text);
                return Err(e.into());
            }
        };

        // Account for every character of the flush before anything else
        // fallible runs: completed text goes to history, the incomplete
        // tail back into the buffer.
        self.history.append(&result.completed_text, self.config.history_cap());
        if let Some(incomplete) = result.incomplete_text() {
            self.buffer.reinject(incomplete);
        }

        let placement_actions = merge_orphan_creates(result.actions);

        let mut final_actions = placement_actions.clone();
        let mutated = TreeActionApplier::new(&mut self.tree).apply(&placement_actions);
        let mut all_mutated: BTreeSet<NodeId> = mutated.clone();

        // Phase 2: one optimiser pass per mutated node, ascending id.
        // The agent reads a snapshot; the applier re-verifies ids against
        // the live tree.
        for node_id in mutated {
            let snapshot = self.tree.clone();
            let optimization_actions = self.optimizer_agent.run(node_id, &snapshot).await?;
            if optimization_actions.is_empty() {
                continue;
            }
            let opt_mutated =
                TreeActionApplier::new(&mut self.tree).apply(&optimization_actions);
            all_mutated.extend(opt_mutated);
            final_actions.extend(optimization_actions);
        }

        self.run_maintenance_if_due(&mut all_mutated).await;

        if !final_actions.is_empty() {
            info!(
                "cycle applied {} actions touching {} nodes",
                final_actions.len(),
                all_mutated.len()
            );
        }
        self.publish(&all_mutated);

        Ok(final_actions)
    }

    /// Run the connect-orphans pass when enough nodes have accumulated
    /// since the last one. Failures here never fail the cycle: the hot
    /// path has already committed its work.
    async fn run_maintenance_if_due(&mut self, all_mutated: &mut BTreeSet<NodeId>) {
        let interval = self.config.orphan_connection_interval;
        if interval == 0 {
            return;
        }
        if self.tree.node_count() < self.nodes_at_last_maintenance + interval {
            return;
        }
        self.nodes_at_last_maintenance = self.tree.node_count();

        match self
            .connect_orphans_agent
            .run(&self.tree, DEFAULT_MIN_GROUP_SIZE, DEFAULT_MAX_ROOTS)
            .await
        {
            Ok(actions) if !actions.is_empty() => {
                info!("connect-orphans pass produced {} new parents", actions.len());
                let mutated = TreeActionApplier::new(&mut self.tree).apply(&actions);
                all_mutated.extend(mutated);
            }
            Ok(_) => {}
            Err(e) => warn!("connect-orphans pass failed: {}", e),
        }
    }

    fn publish(&self, node_ids: &BTreeSet<NodeId>) {
        if let Some(writer) = &self.writer {
            if let Err(e) = writer.write_nodes(&self.tree, node_ids) {
                warn!("markdown publish failed: {}", e);
            }
        }
    }
}

/// Collapse multiple orphan CREATEs from one phase-1 batch into a single
/// CREATE. The merged node takes the position of the first orphan in the
/// batch; names are `" & "`-joined, contents blank-line-joined.
pub fn merge_orphan_creates(actions: Vec<TreeAction>) -> Vec<TreeAction> {
    let orphan_count = actions
        .iter()
        .filter(|a| matches!(a, TreeAction::Create { parent_node_id: None, .. }))
        .count();
    if orphan_count <= 1 {
        return actions;
    }

    let mut names = Vec::with_capacity(orphan_count);
    let mut contents = Vec::with_capacity(orphan_count);
    let mut summaries = Vec::with_capacity(orphan_count);
    let mut merged_slot: Option<usize> = None;

    let mut kept: Vec<Option<TreeAction>> = Vec::with_capacity(actions.len());
    for action in actions {
        match action {
            TreeAction::Create {
                parent_node_id: None,
                new_node_name,
                content,
                summary,
                ..
            } => {
                names.push(new_node_name);
                contents.push(content);
                if !summary.is_empty() {
                    summaries.push(summary);
                }
                if merged_slot.is_none() {
                    merged_slot = Some(kept.len());
                    kept.push(None); // placeholder for the merged create
                }
            }
            other => kept.push(Some(other)),
        }
    }

    let merged = TreeAction::Create {
        parent_node_id: None,
        new_node_name: names.join(" & "),
        content: contents.join("\n\n"),
        summary: summaries.join(" "),
        relationship: String::new(),
    };

    debug!("merged {} orphan creates into one", orphan_count);

    kept.into_iter()
        .enumerate()
        .map(|(i, slot)| match slot {
            Some(action) => action,
            None => {
                debug_assert_eq!(Some(i), merged_slot);
                merged.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orphan(name: &str, content: &str) -> TreeAction {
        TreeAction::Create {
            parent_node_id: None,
            new_node_name: name.into(),
            content: content.into(),
            summary: format!("{} summary", name),
            relationship: String::new(),
        }
    }

    #[test]
    fn single_orphan_left_alone() {
        let actions = vec![orphan("A", "a")];
        assert_eq!(merge_orphan_creates(actions.clone()), actions);
    }

    #[test]
    fn two_orphans_merge_into_one() {
        let actions = vec![
            TreeAction::Append { target_node_id: 1, content: "x".into() },
            orphan("First Orphan", "first content"),
            orphan("Second Orphan", "second content"),
        ];
        let merged = merge_orphan_creates(actions);
        assert_eq!(merged.len(), 2);
        match &merged[1] {
            TreeAction::Create { new_node_name, content, parent_node_id, .. } => {
                assert_eq!(new_node_name, "First Orphan & Second Orphan");
                assert_eq!(content, "first content\n\nsecond content");
                assert_eq!(*parent_node_id, None);
            }
            other => panic!("expected merged create, got {:?}", other),
        }
    }

    #[test]
    fn parented_creates_survive_merge() {
        let actions = vec![
            orphan("A", "a"),
            TreeAction::Create {
                parent_node_id: Some(1),
                new_node_name: "Child".into(),
                content: "c".into(),
                summary: "s".into(),
                relationship: "subtask of".into(),
            },
            orphan("B", "b"),
        ];
        let merged = merge_orphan_creates(actions);
        assert_eq!(merged.len(), 2);
        assert!(matches!(
            &merged[1],
            TreeAction::Create { parent_node_id: Some(1), .. }
        ));
    }
}
