//! Error types for tree mutations

use crate::node::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("invalid parent: {0}")]
    InvalidParent(NodeId),
}

pub type Result<T> = std::result::Result<T, TreeError>;
