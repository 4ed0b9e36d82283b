//! Core BlockStore implementation.
//!
//! The store owns one `BlockSequence` plus the current selection and applies
//! every authoring mutation synchronously. Structural mutations (`add`,
//! `remove`, `move_block`, `replace_all`) renumber `order` before returning, so
//! the order invariant holds between any two calls.

use tracing::trace;

use super::model::{Block, BlockKind, BlockPayload, BlockSequence};

/// Authoritative in-memory sequence for one authoring session.
///
/// No operation fails for normal authoring input: unknown ids are reported
/// through the return value and out-of-range move indices are clamped.
#[derive(Debug, Clone, Default)]
pub struct BlockStore {
    sequence: BlockSequence,
    /// Id of the selected block. Always refers to a block in `sequence`.
    selected: Option<String>,
}

impl BlockStore {
    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Creates an empty store with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store from a persisted sequence. Nothing is selected.
    pub fn from_sequence(sequence: BlockSequence) -> Self {
        Self {
            sequence,
            selected: None,
        }
    }

    /// Returns an immutable copy of the current sequence for persistence.
    pub fn snapshot(&self) -> BlockSequence {
        self.sequence.clone()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// The current sequence.
    pub fn sequence(&self) -> &BlockSequence {
        &self.sequence
    }

    /// The current blocks in order.
    pub fn blocks(&self) -> &[Block] {
        self.sequence.blocks()
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Gets a block by id.
    pub fn get(&self, id: &str) -> Option<&Block> {
        self.sequence.get(id)
    }

    /// Id of the selected block, if any.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected block, if any.
    pub fn selected_block(&self) -> Option<&Block> {
        self.selected.as_deref().and_then(|id| self.sequence.get(id))
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Appends an empty block of the given kind, selects it and returns it.
    pub fn add(&mut self, kind: BlockKind) -> &Block {
        self.push(Block::empty(kind))
    }

    /// Appends a prepared block, selects it and returns it.
    ///
    /// The block's `order` is overwritten with the current length. The id is
    /// not checked against existing blocks; callers supply a fresh one.
    pub fn push(&mut self, mut block: Block) -> &Block {
        let index = self.sequence.len();
        block.order = index as u32;
        trace!(id = %block.id, kind = %block.kind(), order = index, "adding block");

        self.selected = Some(block.id.clone());
        let blocks = self.sequence.blocks_mut();
        blocks.push(block);
        &blocks[index]
    }

    /// Replaces the payload of the block with the given id.
    ///
    /// `id` and `order` are left unchanged. Returns false if no block matches.
    pub fn update(&mut self, id: &str, payload: BlockPayload) -> bool {
        match self.sequence.blocks_mut().iter_mut().find(|b| b.id == id) {
            Some(block) => {
                trace!(id, kind = %payload.kind(), "updating block");
                block.payload = payload;
                true
            }
            None => {
                trace!(id, "update ignored, block not found");
                false
            }
        }
    }

    /// Applies a function to the payload of the block with the given id.
    /// Returns false if no block matches.
    pub fn update_with<F>(&mut self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut BlockPayload),
    {
        match self.sequence.blocks_mut().iter_mut().find(|b| b.id == id) {
            Some(block) => {
                f(&mut block.payload);
                true
            }
            None => false,
        }
    }

    /// Deletes the block with the given id and renumbers the rest.
    ///
    /// Clears the selection if it pointed at the removed block.
    pub fn remove(&mut self, id: &str) -> Option<Block> {
        let index = self.sequence.position(id)?;
        let removed = self.sequence.blocks_mut().remove(index);
        self.sequence.renumber();

        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        trace!(id, index, remaining = self.sequence.len(), "removed block");
        Some(removed)
    }

    /// Moves the block at `from` to position `to` and renumbers every block.
    ///
    /// Both indices are clamped to `[0, len - 1]`. Moving within an empty
    /// sequence does nothing.
    pub fn move_block(&mut self, from: usize, to: usize) {
        let len = self.sequence.len();
        if len == 0 {
            return;
        }
        let from = from.min(len - 1);
        let to = to.min(len - 1);

        let blocks = self.sequence.blocks_mut();
        let block = blocks.remove(from);
        blocks.insert(to, block);
        self.sequence.renumber();
        trace!(from, to, "moved block");
    }

    /// Selects the block with the given id, or clears the selection on `None`.
    ///
    /// Selecting an id that is not in the sequence leaves the selection
    /// unchanged and returns false.
    pub fn select(&mut self, id: Option<&str>) -> bool {
        match id {
            None => {
                self.selected = None;
                true
            }
            Some(id) if self.sequence.get(id).is_some() => {
                self.selected = Some(id.to_string());
                true
            }
            Some(_) => false,
        }
    }

    /// Substitutes the whole sequence, as when accepting generated output.
    ///
    /// Selects the first incoming block, or clears the selection when the new
    /// sequence is empty.
    pub fn replace_all(&mut self, sequence: BlockSequence) {
        self.selected = sequence.first().map(|b| b.id.clone());
        trace!(len = sequence.len(), "replacing sequence");
        self.sequence = sequence;
    }
}

impl From<BlockSequence> for BlockStore {
    fn from(sequence: BlockSequence) -> Self {
        Self::from_sequence(sequence)
    }
}

// =============================================================================
// TESTS
// =============================================================================
