//! VoiceTree Markdown - Vault serialisation
//!
//! The markdown vault on disk is the canonical store: one file per node,
//! YAML frontmatter plus a `_Links:_` section encoding the edges. The
//! writer emits changed nodes; the loader parses a vault back into a
//! [`voicetree_core::DecisionTree`], round-trip stable modulo timestamps.

pub mod loader;
pub mod writer;

pub use loader::load_tree;
pub use writer::MarkdownWriter;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("vault directory does not exist: {0}")]
    MissingVault(String),
}

pub type Result<T> = std::result::Result<T, MarkdownError>;
