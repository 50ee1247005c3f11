//! VoiceTree LLM - Provider adapters with structured JSON output

pub mod gemini;
pub mod mock;
pub mod provider;
pub mod retry;
pub mod structured;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use provider::{LlmError, LlmProvider, LlmRequest, LlmResult};
pub use retry::RetryConfig;
pub use structured::call_structured;
