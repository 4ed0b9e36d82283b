//! StepBlocks - step-block workflow model for training procedures.
//!
//! An author builds a linear procedure out of typed blocks (information,
//! navigation, questions). The crate provides:
//!
//! - **`BlockStore`**: the ordered, mutable sequence with a dense `order` invariant
//! - **Validator**: turns free-form AI completion text into a trusted sequence, or rejects it
//! - **`GenerationOrchestrator`**: the request/response lifecycle against a chat-completion service
//!
//! # Example
//!
//! ```rust
//! use stepblocks::{BlockKind, BlockStore, validate_text};
//!
//! let mut store = BlockStore::new();
//! store.add(BlockKind::Information);
//! store.add(BlockKind::Question);
//! store.move_block(1, 0);
//! assert_eq!(store.blocks()[0].kind(), BlockKind::Question);
//!
//! // Accept a generated sequence wholesale
//! let reply = r#"Sure! {"blocks": [{"id": "a", "kind": "goto", "order": 4,
//!     "payload": {"instructions": "Go to bay 2"}}]}"#;
//! let generated = validate_text(reply).unwrap();
//! store.replace_all(generated);
//! assert_eq!(store.selected(), Some("a"));
//! ```

pub mod error;

// Sequence module
pub mod sequence;

// Generation module
pub mod generation;

// Re-exports for convenience
pub use error::{GenerationError, StepError, StepResult};
pub use generation::{
    validate_response, validate_text, ChatCompletion, GenerationClient, GenerationOrchestrator,
    GenerationRequest, GenerationResult, GenerationState, GeneratorConfig,
};
pub use sequence::{
    AnswerMode, Block, BlockKind, BlockPayload, BlockSequence, BlockStore, GotoPayload,
    InformationPayload, QuestionPayload,
};

#[cfg(feature = "client")]
pub use generation::ChatCompletionsClient;

#[cfg(feature = "wasm")]
pub use sequence::JsBlockStore;
