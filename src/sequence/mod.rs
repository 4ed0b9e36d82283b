//! Step-block sequence module.
//!
//! Provides the block data model, the in-memory `BlockStore` that authoring
//! surfaces mutate, and the binary snapshot encoding.

pub mod model;
pub mod snapshot;
pub mod store;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use model::{
    AnswerMode, Block, BlockKind, BlockPayload, BlockSequence, GotoPayload, InformationPayload,
    QuestionPayload,
};
pub use store::BlockStore;

#[cfg(feature = "wasm")]
pub use wasm::JsBlockStore;
