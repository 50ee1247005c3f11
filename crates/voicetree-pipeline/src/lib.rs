//! VoiceTree Pipeline - From transcript fragments to tree mutations
//!
//! Owns the text buffers and drives the two-phase agent workflow:
//! buffer fills -> phase 1 places text -> apply -> phase 2 optimises each
//! touched node -> apply -> markdown vault updated.

pub mod buffer;
pub mod history;
pub mod orchestrator;

pub use buffer::BufferManager;
pub use history::HistoryManager;
pub use orchestrator::{ChunkProcessor, PipelineError};
