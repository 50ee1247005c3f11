//! Wire models for structured agent output
//!
//! Each response type carries its provider-native response schema so the
//! model is constrained at generation time, not just validated after.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use voicetree_core::{NodeId, TreeAction};

/// One segmentation unit. Incomplete segments are never acted on; the
/// trailing one is re-injected into the buffer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SegmentModel {
    pub reasoning: String,
    pub text: String,
    pub is_complete: bool,
}

#[derive(Debug, Deserialize)]
pub struct SegmentationResponse {
    pub segments: Vec<SegmentModel>,
}

pub fn segmentation_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "segments": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "reasoning": { "type": "STRING" },
                        "text": { "type": "STRING" },
                        "is_complete": { "type": "BOOLEAN" }
                    },
                    "required": ["reasoning", "text", "is_complete"]
                }
            }
        },
        "required": ["segments"]
    })
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum PlacementKind {
    #[serde(rename = "APPEND")]
    Append,
    #[serde(rename = "CREATE")]
    Create,
}

/// Placement decision for one complete segment.
#[derive(Debug, Deserialize)]
pub struct PlacementDecision {
    pub reasoning: String,
    pub action: PlacementKind,
    #[serde(default)]
    pub target_node_id: Option<NodeId>,
    #[serde(default)]
    pub new_node_name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub parent_node_id: Option<NodeId>,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlacementResponse {
    pub placements: Vec<PlacementDecision>,
}

pub fn placement_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "placements": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "reasoning": { "type": "STRING" },
                        "action": { "type": "STRING", "enum": ["APPEND", "CREATE"] },
                        "target_node_id": { "type": "INTEGER", "nullable": true },
                        "new_node_name": { "type": "STRING", "nullable": true },
                        "summary": { "type": "STRING", "nullable": true },
                        "parent_node_id": { "type": "INTEGER", "nullable": true },
                        "relationship": { "type": "STRING", "nullable": true }
                    },
                    "required": ["reasoning", "action"]
                }
            }
        },
        "required": ["placements"]
    })
}

/// Output of phase 1 for one flushed buffer.
#[derive(Debug, Default)]
pub struct AppendAgentResult {
    /// One APPEND/CREATE per complete segment, in segment order.
    pub actions: Vec<TreeAction>,
    /// All segments, incomplete ones included.
    pub segments: Vec<SegmentModel>,
    /// Concatenation of every complete segment's text.
    pub completed_text: String,
}

impl AppendAgentResult {
    /// Text of the trailing incomplete segment, if the segmentation left one.
    pub fn incomplete_text(&self) -> Option<&str> {
        self.segments
            .iter()
            .rev()
            .find(|s| !s.is_complete)
            .map(|s| s.text.as_str())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
pub enum OptimizationKind {
    #[serde(rename = "UPDATE")]
    Update,
    #[serde(rename = "CREATE")]
    Create,
}

/// One corrective step proposed by the optimiser.
#[derive(Debug, Deserialize)]
pub struct OptimizationDecision {
    pub action: OptimizationKind,
    #[serde(default)]
    pub new_content: Option<String>,
    #[serde(default)]
    pub new_summary: Option<String>,
    #[serde(default)]
    pub new_node_name: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OptimizationResponse {
    pub reasoning: String,
    #[serde(default)]
    pub actions: Vec<OptimizationDecision>,
}

pub fn optimization_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "reasoning": { "type": "STRING" },
            "actions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "action": { "type": "STRING", "enum": ["UPDATE", "CREATE"] },
                        "new_content": { "type": "STRING", "nullable": true },
                        "new_summary": { "type": "STRING", "nullable": true },
                        "new_node_name": { "type": "STRING", "nullable": true },
                        "content": { "type": "STRING", "nullable": true },
                        "summary": { "type": "STRING", "nullable": true },
                        "relationship": { "type": "STRING", "nullable": true }
                    },
                    "required": ["action"]
                }
            }
        },
        "required": ["reasoning", "actions"]
    })
}

/// A proposed grouping of related roots under a new parent.
#[derive(Debug, Deserialize)]
pub struct OrphanGrouping {
    pub root_node_titles: Vec<String>,
    pub parent_title: String,
    pub parent_summary: String,
    pub relationship: String,
}

#[derive(Debug, Deserialize)]
pub struct ConnectOrphansResponse {
    pub reasoning: String,
    #[serde(default)]
    pub groupings: Vec<OrphanGrouping>,
}

pub fn connect_orphans_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "reasoning": { "type": "STRING" },
            "groupings": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "root_node_titles": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "parent_title": { "type": "STRING" },
                        "parent_summary": { "type": "STRING" },
                        "relationship": { "type": "STRING" }
                    },
                    "required": ["root_node_titles", "parent_title", "parent_summary", "relationship"]
                }
            }
        },
        "required": ["reasoning", "groupings"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segmentation_response_parses() {
        let raw = r#"{"segments":[{"reasoning":"r","text":"t","is_complete":true}]}"#;
        let parsed: SegmentationResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.segments.len(), 1);
        assert!(parsed.segments[0].is_complete);
    }

    #[test]
    fn placement_decision_optional_fields_default() {
        let raw = r#"{"reasoning":"r","action":"APPEND","target_node_id":4}"#;
        let parsed: PlacementDecision = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.action, PlacementKind::Append);
        assert_eq!(parsed.target_node_id, Some(4));
        assert!(parsed.new_node_name.is_none());
    }

    #[test]
    fn optimization_empty_actions_is_valid() {
        let raw = r#"{"reasoning":"node is already atomic"}"#;
        let parsed: OptimizationResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.actions.is_empty());
    }

    #[test]
    fn incomplete_text_finds_trailing_segment() {
        let result = AppendAgentResult {
            actions: vec![],
            segments: vec![
                SegmentModel { reasoning: "a".into(), text: "done.".into(), is_complete: true },
                SegmentModel { reasoning: "b".into(), text: "but the".into(), is_complete: false },
            ],
            completed_text: "done.".into(),
        };
        assert_eq!(result.incomplete_text(), Some("but the"));
    }
}
