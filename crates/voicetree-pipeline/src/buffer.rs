//! Transcript fragment buffering
//!
//! Fragments accumulate until the size threshold is crossed; the
//! orchestrator then flushes and runs one processing cycle. When phase 1
//! reports a trailing incomplete segment, that text is re-injected and
//! leads the next flush. No timer: flushing is driven purely by adds.

use tracing::debug;

pub struct BufferManager {
    buffer: String,
    threshold: usize,
}

impl BufferManager {
    pub fn new(threshold: usize) -> Self {
        Self { buffer: String::new(), threshold }
    }

    /// Append a fragment. A trailing space keeps fragments from fusing.
    pub fn add(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
        self.buffer.push(' ');
    }

    /// True once enough text has accumulated to be worth an LLM cycle.
    pub fn is_ready(&self) -> bool {
        self.buffer.trim().len() >= self.threshold
    }

    /// Hand the accumulated text over and clear the buffer.
    pub fn flush(&mut self) -> String {
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        debug!("flushed {} chars", text.len());
        text
    }

    /// Put an incomplete trailing segment back; it precedes whatever
    /// arrives next.
    pub fn reinject(&mut self, incomplete_text: &str) {
        if incomplete_text.is_empty() {
            return;
        }
        let mut restored = String::with_capacity(incomplete_text.len() + 1 + self.buffer.len());
        restored.push_str(incomplete_text);
        restored.push(' ');
        restored.push_str(&self.buffer);
        self.buffer = restored;
        debug!("re-injected {} chars of incomplete text", incomplete_text.len());
    }

    pub fn len(&self) -> usize {
        self.buffer.trim().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.trim().is_empty()
    }

    pub fn contents(&self) -> &str {
        &self.buffer
    }
}
