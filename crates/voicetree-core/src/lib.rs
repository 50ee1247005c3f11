//! VoiceTree Core - Tree data model, actions, and context selection

pub mod actions;
pub mod config;
pub mod context;
pub mod error;
pub mod node;
pub mod params;
pub mod stopwords;
pub mod tfidf;
pub mod tree;

pub use actions::{TreeAction, TreeActionApplier};
pub use config::VoiceTreeConfig;
pub use error::{Result, TreeError};
pub use node::{Node, NodeId};
pub use tree::{DecisionTree, Neighbor, NeighborRelation};
