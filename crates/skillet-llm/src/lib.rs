//! # skillet-llm
//!
//! Abstraction layer over chat models with tool calling. Ships an Ollama
//! adapter (the default backend) and a scripted mock for tests.

pub mod mock;
pub mod ollama;
pub mod provider;

pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use provider::{LlmProvider, LlmRequest, LlmResponse, StopReason, Usage};
