//! # relay-llm
//!
//! Concrete [`TaskExecutor`](relay_core::TaskExecutor) implementations.
//!
//! - [`openai::OpenAiExecutor`]: sends each task to the `OpenAI` chat
//!   completions API and returns the assistant's reply
//! - [`echo::EchoExecutor`]: returns the task text, for local development
//!
//! ## Crate Position
//!
//! Depends on: relay-core. Depended on by: relay-agent.

#![deny(unsafe_code)]

pub mod echo;
pub mod openai;

pub use echo::EchoExecutor;
pub use openai::{OpenAiConfig, OpenAiExecutor};
