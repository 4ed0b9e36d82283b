//! AI-assisted generation of block sequences.
//!
//! - `request`: `GenerationRequest` and prompt construction
//! - `client`: chat-completion wire types, the `GenerationClient` seam and the HTTP client
//! - `validator`: untrusted completion text to trusted `BlockSequence`
//! - `orchestrator`: the request/response lifecycle
//! - `config`: endpoint settings

pub mod client;
pub mod config;
pub mod orchestrator;
pub mod request;
pub mod validator;

// Re-exports for convenience
pub use client::{ChatChoice, ChatCompletion, ChatMessage, GenerationClient};
pub use config::GeneratorConfig;
pub use orchestrator::{GenerationOrchestrator, GenerationState};
pub use request::{GenerationRequest, Prompt};
pub use validator::{validate_response, validate_text, GenerationResult};

#[cfg(feature = "client")]
pub use client::ChatCompletionsClient;
