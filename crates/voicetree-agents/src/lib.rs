//! VoiceTree Agents - LLM workflow stages over the decision tree
//!
//! Phase 1 ([`AppendToRelevantNodeAgent`]) places freshly transcribed text
//! into the tree. Phase 2 ([`SingleAbstractionOptimizerAgent`]) keeps each
//! touched node down to one idea. Off the hot path,
//! [`ConnectOrphansAgent`] groups accumulated roots under new parents.

pub mod append_agent;
pub mod connect_orphans;
pub mod models;
pub mod optimizer_agent;
pub mod prompts;

pub use append_agent::AppendToRelevantNodeAgent;
pub use connect_orphans::ConnectOrphansAgent;
pub use models::{AppendAgentResult, SegmentModel};
pub use optimizer_agent::SingleAbstractionOptimizerAgent;
