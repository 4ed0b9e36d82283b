//! WASM bindings for the sequence module.
//!
//! This module provides JavaScript-friendly wrappers around `BlockStore` and
//! the response validator for use by a browser authoring surface.

use js_sys::Uint8Array;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;

use super::model::{BlockKind, BlockPayload, BlockSequence};
use super::snapshot;
use super::store::BlockStore;
use crate::error::{GenerationError, StepError};
use crate::generation::validator::validate_text;

/// Serialize a value to JsValue with maps as plain JS objects (not Map).
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&Serializer::new().serialize_maps_as_objects(true))
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

impl From<StepError> for JsValue {
    fn from(err: StepError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

impl From<GenerationError> for JsValue {
    fn from(err: GenerationError) -> JsValue {
        JsValue::from_str(&err.to_string())
    }
}

// =============================================================================
// MAIN WRAPPER TYPE
// =============================================================================

/// JavaScript-friendly wrapper around BlockStore.
///
/// Every method runs synchronously, so the UI can re-render from
/// `getBlocks()` right after each call.
#[wasm_bindgen]
pub struct JsBlockStore {
    inner: BlockStore,
}

#[wasm_bindgen]
impl JsBlockStore {
    /// Creates a new empty store.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const store = new JsBlockStore();
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsBlockStore {
        JsBlockStore {
            inner: BlockStore::new(),
        }
    }

    /// Creates a store from an array of persisted blocks.
    ///
    /// Blocks are sorted by their `order` field and renumbered. Throws if two
    /// blocks share an id.
    #[wasm_bindgen(js_name = fromBlocks)]
    pub fn from_blocks(blocks: JsValue) -> Result<JsBlockStore, JsValue> {
        let sequence: BlockSequence = from_value(blocks)?;
        sequence.ensure_unique_ids()?;
        Ok(JsBlockStore {
            inner: BlockStore::from_sequence(sequence),
        })
    }

    /// Loads from snapshot bytes (Uint8Array).
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(bytes: &[u8]) -> Result<JsBlockStore, JsValue> {
        let sequence = snapshot::load(bytes)?;
        Ok(JsBlockStore {
            inner: BlockStore::from_sequence(sequence),
        })
    }

    /// Saves the current sequence to snapshot bytes (returns Uint8Array).
    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&self) -> Result<Uint8Array, JsValue> {
        let bytes = snapshot::save(self.inner.sequence())?;
        Ok(Uint8Array::from(&bytes[..]))
    }

    /// Gets the current blocks as an array of plain objects.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const blocks = store.getBlocks();
    /// console.log(blocks[0].kind, blocks[0].order); // "information" 0
    /// ```
    #[wasm_bindgen(js_name = getBlocks)]
    pub fn get_blocks(&self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(self.inner.sequence())?)
    }

    /// Gets the selected block id, or null.
    #[wasm_bindgen(js_name = getSelected)]
    pub fn get_selected(&self) -> Option<String> {
        self.inner.selected().map(str::to_string)
    }

    /// Number of blocks.
    #[wasm_bindgen(js_name = length)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }
}

// =============================================================================
// AUTHORING METHODS
// =============================================================================

#[wasm_bindgen]
impl JsBlockStore {
    /// Appends an empty block of the given kind and returns it.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const block = store.add('question');
    /// console.log(block.id, block.order);
    /// ```
    #[wasm_bindgen(js_name = add)]
    pub fn add(&mut self, kind: &str) -> Result<JsValue, JsValue> {
        let kind = BlockKind::from_tag(kind)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown block kind: {}", kind)))?;
        let block = self.inner.add(kind);
        Ok(to_js_value(block)?)
    }

    /// Replaces a block's content.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// store.update(id, { kind: 'goto', payload: { instructions: 'Go to bay 3' } });
    /// ```
    #[wasm_bindgen(js_name = update)]
    pub fn update(&mut self, id: &str, payload: JsValue) -> Result<(), JsValue> {
        let payload: BlockPayload = from_value(payload)?;
        if self.inner.update(id, payload) {
            Ok(())
        } else {
            Err(StepError::block_not_found(id).into())
        }
    }

    /// Deletes a block. Returns false if the id is unknown.
    #[wasm_bindgen(js_name = remove)]
    pub fn remove(&mut self, id: &str) -> bool {
        self.inner.remove(id).is_some()
    }

    /// Moves the block at `from` to `to` (drag-to-reorder).
    ///
    /// # Example (JavaScript)
    /// ```js
    /// store.moveBlock(0, 2); // Move first block to third position
    /// ```
    #[wasm_bindgen(js_name = moveBlock)]
    pub fn move_block(&mut self, from: usize, to: usize) {
        self.inner.move_block(from, to);
    }

    /// Selects a block (pass null to clear). Unknown ids are ignored.
    #[wasm_bindgen(js_name = select)]
    pub fn select(&mut self, id: Option<String>) -> bool {
        self.inner.select(id.as_deref())
    }

    /// Replaces every block with the given sequence, usually the output of
    /// `validateResponse`. Throws, leaving the store untouched, if two blocks
    /// share an id.
    #[wasm_bindgen(js_name = replaceAll)]
    pub fn replace_all(&mut self, blocks: JsValue) -> Result<(), JsValue> {
        let sequence: BlockSequence = from_value(blocks)?;
        sequence.ensure_unique_ids()?;
        self.inner.replace_all(sequence);
        Ok(())
    }
}

// =============================================================================
// GENERATION
// =============================================================================

/// Validates raw AI completion text, returning the trusted blocks.
///
/// Throws the failure message when the text is rejected; the caller's
/// current sequence is never touched.
///
/// # Example (JavaScript)
/// ```js
/// try {
///   store.replaceAll(validateResponse(completionText));
/// } catch (e) {
///   showError(e);
/// }
/// ```
#[wasm_bindgen(js_name = validateResponse)]
pub fn validate_response_text(text: &str) -> Result<JsValue, JsValue> {
    let sequence = validate_text(text)?;
    Ok(to_js_value(&sequence)?)
}

impl Default for JsBlockStore {
    fn default() -> Self {
        Self::new()
    }
}
