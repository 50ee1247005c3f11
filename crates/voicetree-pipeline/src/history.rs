//! Rolling transcript history
//!
//! Holds previously processed transcript only, never the live buffer.
//! Trimming is word-boundary aware: after a cut, the partial word at the
//! front is dropped so prompts never open mid-word. Optionally mirrored to
//! a file: loaded whole on construction, appended on every update.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, error};

#[derive(Default)]
pub struct HistoryManager {
    history: String,
    file_path: Option<PathBuf>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// History mirrored to `path`. Existing contents are loaded into
    /// memory up front.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let history = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(_) => String::new(),
        };
        Self { history, file_path: Some(path) }
    }

    /// Append processed text, inserting a space at a seam where both sides
    /// are non-whitespace, then trim from the left to `max_length`.
    /// `max_length <= 0` disables trimming.
    pub fn append(&mut self, text: &str, max_length: usize) {
        if text.is_empty() {
            return;
        }

        let needs_space = matches!(
            (self.history.chars().last(), text.chars().next()),
            (Some(prev), Some(next)) if !prev.is_whitespace() && !next.is_whitespace()
        );
        if needs_space {
            self.history.push(' ');
        }
        self.history.push_str(text);

        if max_length > 0 && self.history.chars().count() > max_length {
            let trimmed = tail_chars(&self.history, max_length);

            // Skip the partial word at the cut, if the tail has any
            // whitespace to anchor to.
            self.history = match trimmed.find(char::is_whitespace) {
                Some(first_space) => {
                    let after = &trimmed[first_space..];
                    after.trim_start().to_string()
                }
                None => trimmed.to_string(),
            };
        }

        debug!("history now {} chars", self.history.len());

        if let Some(path) = &self.file_path {
            if let Err(e) = append_to_file(path, text) {
                error!("failed to persist history to {}: {}", path.display(), e);
            }
        }
    }

    /// Up to `max_length` trailing characters. Zero returns empty.
    pub fn get(&self, max_length: usize) -> &str {
        if max_length == 0 {
            return "";
        }
        tail_chars(&self.history, max_length)
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}

fn tail_chars(s: &str, max: usize) -> &str {
    let count = s.chars().count();
    if count <= max {
        return s;
    }
    let skip = count - max;
    match s.char_indices().nth(skip) {
        Some((byte_index, _)) => &s[byte_index..],
        None => "",
    }
}

fn append_to_file(path: &PathBuf, text: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_inserted_at_non_whitespace_seam() {
        let mut history = HistoryManager::new();
        history.append("first", 100);
        history.append("second", 100);
        assert_eq!(history.get(100), "first second");
    }

    #[test]
    fn no_double_space_when_seam_has_whitespace() {
        let mut history = HistoryManager::new();
        history.append("first ", 100);
        history.append("second", 100);
        assert_eq!(history.get(100), "first second");
    }

    #[test]
    fn trim_lands_on_word_boundary() {
        let mut history = HistoryManager::new();
        history.append("alpha beta gamma delta", 10);
        let kept = history.get(100);
        assert!(kept.len() <= 10);
        assert_eq!(kept, "delta");
    }

    #[test]
    fn single_word_overflow_falls_back_to_char_trim() {
        let mut history = HistoryManager::new();
        history.append("supercalifragilistic", 5);
        assert_eq!(history.get(100), "istic");
    }

    #[test]
    fn get_zero_is_empty() {
        let mut history = HistoryManager::new();
        history.append("text", 100);
        assert_eq!(history.get(0), "");
    }

    #[test]
    fn get_caps_to_requested_length() {
        let mut history = HistoryManager::new();
        history.append("abcdefghij", 100);
        assert_eq!(history.get(4), "ghij");
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        {
            let mut history = HistoryManager::with_file(&path);
            history.append("first flush.", 1000);
            history.append("second flush.", 1000);
        }
        let reloaded = HistoryManager::with_file(&path);
        let text = reloaded.get(1000);
        assert!(text.contains("first flush."));
        assert!(text.contains("second flush."));
    }
}
