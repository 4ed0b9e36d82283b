//! Request/response lifecycle for AI-assisted generation.
//!
//! The orchestrator never writes into a `BlockStore`. It hands back a trusted
//! sequence and the caller decides whether to accept it with
//! `BlockStore::replace_all`.

use tracing::{info, warn};

use super::client::GenerationClient;
use super::request::GenerationRequest;
use super::validator::{validate_response, GenerationResult};
use crate::error::GenerationError;
use crate::sequence::model::BlockSequence;

/// Observable lifecycle state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GenerationState {
    #[default]
    Idle,
    Requesting,
    Succeeded(BlockSequence),
    Failed(GenerationError),
}

/// Drives one generation at a time against a collaborator.
///
/// Overlapping calls are the caller's responsibility to prevent; `generate`
/// takes `&mut self`, so within one owner they are serialized by the borrow
/// checker.
pub struct GenerationOrchestrator<C> {
    client: C,
    state: GenerationState,
    last_request: Option<GenerationRequest>,
}

impl<C: GenerationClient> GenerationOrchestrator<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: GenerationState::Idle,
            last_request: None,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    /// True while a request is outstanding.
    pub fn is_requesting(&self) -> bool {
        matches!(self.state, GenerationState::Requesting)
    }

    /// The sequence produced by the last successful generation.
    pub fn result(&self) -> Option<&BlockSequence> {
        match &self.state {
            GenerationState::Succeeded(sequence) => Some(sequence),
            _ => None,
        }
    }

    /// The failure recorded by the last generation.
    pub fn last_error(&self) -> Option<&GenerationError> {
        match &self.state {
            GenerationState::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// The most recently recorded request, replayed by `regenerate`.
    pub fn last_request(&self) -> Option<&GenerationRequest> {
        self.last_request.as_ref()
    }

    /// Returns to `Idle`, keeping the recorded request.
    pub fn reset(&mut self) {
        self.state = GenerationState::Idle;
    }

    /// Records the request, asks the collaborator, and validates the reply.
    ///
    /// The outcome is both returned and kept in `state()`. The request is
    /// retained whatever the outcome.
    pub async fn generate(&mut self, request: GenerationRequest) -> GenerationResult {
        info!(
            file = %request.file_name,
            topics = request.topics.len(),
            steps = request.step_count,
            "Requesting block generation"
        );

        let prompt = request.to_prompt();
        self.last_request = Some(request);
        self.state = GenerationState::Requesting;

        let outcome = match self.client.complete(&prompt).await {
            Ok(response) => validate_response(&response),
            Err(err) => Err(err),
        };

        match &outcome {
            Ok(sequence) => {
                info!(blocks = sequence.len(), "Generation succeeded");
                self.state = GenerationState::Succeeded(sequence.clone());
            }
            Err(err) => {
                warn!(error = %err, "Generation failed");
                self.state = GenerationState::Failed(err.clone());
            }
        }
        outcome
    }

    /// Replays the most recently recorded request.
    ///
    /// Without a prior request this returns `NoPriorRequest` and leaves the
    /// state untouched.
    pub async fn regenerate(&mut self) -> GenerationResult {
        match self.last_request.clone() {
            Some(request) => self.generate(request).await,
            None => {
                warn!("Regenerate requested with no prior request");
                Err(GenerationError::NoPriorRequest)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
