//! Binary snapshot encoding for block sequences.
//!
//! A snapshot is an Automerge document whose root holds a single `blocks`
//! list, written and read through autosurgeon's reconcile/hydrate. Hosts that
//! persist sequences in their own format can ignore this module and use the
//! JSON encoding instead.

use automerge::AutoCommit;
use autosurgeon::{hydrate, reconcile, Hydrate, Reconcile};
use tracing::debug;

use super::model::{Block, BlockSequence};
use crate::error::StepResult;

/// Root document structure of a snapshot.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, PartialEq)]
struct SnapshotRoot {
    blocks: Vec<Block>,
}

/// Encodes a sequence into snapshot bytes.
pub fn save(sequence: &BlockSequence) -> StepResult<Vec<u8>> {
    let mut doc = AutoCommit::new();
    let root = SnapshotRoot {
        blocks: sequence.blocks().to_vec(),
    };
    reconcile(&mut doc, &root)?;
    let bytes = doc.save();
    debug!(blocks = sequence.len(), bytes = bytes.len(), "saved snapshot");
    Ok(bytes)
}

/// Decodes snapshot bytes into a sequence.
///
/// Blocks are sorted by their stored `order` and renumbered, so a snapshot
/// written by another tool still yields a dense sequence.
pub fn load(bytes: &[u8]) -> StepResult<BlockSequence> {
    let doc = AutoCommit::load(bytes)?;
    let root: SnapshotRoot = hydrate(&doc)?;
    debug!(blocks = root.blocks.len(), "loaded snapshot");
    Ok(BlockSequence::from_persisted(root.blocks))
}

// =============================================================================
// TESTS
// =============================================================================
