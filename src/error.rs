//! Error types for the step-block model and the generation pipeline.

use thiserror::Error;

/// Result type alias for snapshot and conversion operations.
pub type StepResult<T> = Result<T, StepError>;

/// Errors raised at the edges of the crate: snapshot encoding and decoding,
/// and generator configuration.
///
/// The sequence store itself never fails.
#[derive(Error, Debug)]
pub enum StepError {
    /// Automerge error during document operations.
    #[error("Automerge error: {0}")]
    Automerge(#[from] automerge::AutomergeError),

    /// Autosurgeon hydration error.
    #[error("Hydration error: {0}")]
    Hydrate(#[from] autosurgeon::HydrateError),

    /// Autosurgeon reconcile error.
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] autosurgeon::ReconcileError),

    /// Block not found in the sequence.
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    /// Two blocks in an incoming sequence share an id.
    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(String),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StepError {
    /// Creates a BlockNotFound error.
    pub fn block_not_found(id: impl Into<String>) -> Self {
        Self::BlockNotFound(id.into())
    }

    /// Creates a DuplicateBlockId error.
    pub fn duplicate_block_id(id: impl Into<String>) -> Self {
        Self::DuplicateBlockId(id.into())
    }

    /// Creates a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Failures of AI-assisted generation.
///
/// Every variant is an expected outcome the caller renders; none of them is
/// fatal to the process.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// The collaborator returned zero candidate completions.
    #[error("generation service returned no candidates")]
    EmptyResponse,

    /// Candidate text could not be parsed as JSON.
    #[error("malformed JSON in generation response: {0}")]
    MalformedJson(String),

    /// The parsed object lacks a `blocks` array.
    #[error("generation response has no `blocks` array")]
    MissingBlocksField,

    /// At least one element failed structural validation.
    #[error("invalid block at index {index}: {reason}")]
    InvalidBlockShape { index: usize, reason: String },

    /// `regenerate` was called before any `generate`.
    #[error("no prior generation request to replay")]
    NoPriorRequest,

    /// The collaborator could not be reached or answered with an error.
    #[error("generation transport failure: {0}")]
    Transport(String),
}

impl GenerationError {
    /// Creates a MalformedJson error.
    pub fn malformed_json(msg: impl Into<String>) -> Self {
        Self::MalformedJson(msg.into())
    }

    /// Creates an InvalidBlockShape error.
    pub fn invalid_block(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidBlockShape {
            index,
            reason: reason.into(),
        }
    }

    /// Creates a Transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Short summary for display to an author.
    ///
    /// Transport failures read the same as an empty response; the underlying
    /// diagnostic stays available through `Display` for logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyResponse | Self::Transport(_) => {
                "The generation service did not return any steps. Please try again."
            }
            Self::MalformedJson(_) | Self::MissingBlocksField => {
                "The generation service returned an unreadable answer. Please regenerate."
            }
            Self::InvalidBlockShape { .. } => {
                "The generated steps were incomplete. Please regenerate or edit manually."
            }
            Self::NoPriorRequest => "There is no previous generation to repeat.",
        }
    }
}
