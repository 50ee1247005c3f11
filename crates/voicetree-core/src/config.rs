//! Environment-driven configuration
//!
//! All tunable parameters in one place. Every knob has a default; invalid
//! values fall back to the default with a warning rather than failing.

use std::str::FromStr;
use tracing::warn;

const DEFAULT_BUFFER_SIZE_THRESHOLD: usize = 83;
const DEFAULT_TRANSCRIPT_HISTORY_MULTIPLIER: usize = 3;
const DEFAULT_MAX_NODES_FOR_LLM_CONTEXT: usize = 20;
const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_OUTPUT_DIR: &str = "markdown-vault";

/// Pipeline configuration.
#[derive(Clone, Debug)]
pub struct VoiceTreeConfig {
    /// Buffer flushes once it holds at least this many characters.
    /// Larger buffer: better accuracy, worse latency.
    pub buffer_size_threshold: usize,
    /// History cap is this multiple of the buffer threshold.
    pub transcript_history_multiplier: usize,
    /// Upper bound on nodes shown to the LLM per prompt.
    pub max_nodes_for_llm_context: usize,
    /// Target model identifier.
    pub llm_model: String,
    /// Run the connect-orphans maintenance pass every this many new nodes.
    /// Zero disables the pass.
    pub orphan_connection_interval: usize,
    /// Directory the markdown vault is written to.
    pub output_dir: String,
}

impl Default for VoiceTreeConfig {
    fn default() -> Self {
        Self {
            buffer_size_threshold: DEFAULT_BUFFER_SIZE_THRESHOLD,
            transcript_history_multiplier: DEFAULT_TRANSCRIPT_HISTORY_MULTIPLIER,
            max_nodes_for_llm_context: DEFAULT_MAX_NODES_FOR_LLM_CONTEXT,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            orphan_connection_interval: 0,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
        }
    }
}

impl VoiceTreeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            buffer_size_threshold: env_parse(
                "BUFFER_SIZE_THRESHOLD",
                defaults.buffer_size_threshold,
            ),
            transcript_history_multiplier: env_parse(
                "TRANSCRIPT_HISTORY_MULTIPLIER",
                defaults.transcript_history_multiplier,
            ),
            max_nodes_for_llm_context: env_parse(
                "MAX_NODES_FOR_LLM_CONTEXT",
                defaults.max_nodes_for_llm_context,
            ),
            llm_model: std::env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            orphan_connection_interval: env_parse(
                "ORPHAN_CONNECTION_INTERVAL",
                defaults.orphan_connection_interval,
            ),
            output_dir: std::env::var("OUTPUT_DIR").unwrap_or(defaults.output_dir),
        }
    }

    /// Maximum characters of rolling transcript history fed into prompts.
    pub fn history_cap(&self) -> usize {
        self.transcript_history_multiplier * self.buffer_size_threshold
    }
}

fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(v) => v,
            Err(_) => {
                warn!("invalid value for {}: {:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = VoiceTreeConfig::default();
        assert_eq!(cfg.buffer_size_threshold, 83);
        assert_eq!(cfg.transcript_history_multiplier, 3);
        assert_eq!(cfg.history_cap(), 249);
        assert_eq!(cfg.max_nodes_for_llm_context, 20);
        assert_eq!(cfg.orphan_connection_interval, 0);
    }
}
