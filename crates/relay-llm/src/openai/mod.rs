//! `OpenAI` chat-completions executor.
//!
//! `executor` (entry point) and `types` (wire format).

pub mod executor;
pub mod types;

pub use executor::OpenAiExecutor;
pub use types::OpenAiConfig;
