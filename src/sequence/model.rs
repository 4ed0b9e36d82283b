//! Data models for step blocks and block sequences.
//!
//! These types carry serde derives for the JSON wire shape and autosurgeon
//! derives for the binary snapshot encoding.

use std::collections::HashSet;

use autosurgeon::{Hydrate, Reconcile};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::{StepError, StepResult};

// =============================================================================
// BLOCK KIND
// =============================================================================

/// The three block tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Information,
    Goto,
    Question,
}

impl BlockKind {
    /// All known kinds, in declaration order.
    pub const ALL: [BlockKind; 3] = [BlockKind::Information, BlockKind::Goto, BlockKind::Question];

    /// The wire tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Information => "information",
            BlockKind::Goto => "goto",
            BlockKind::Question => "question",
        }
    }

    /// Parses a wire tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Informational content shown to the trainee.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InformationPayload {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl InformationPayload {
    /// Creates an information payload with the given body text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }

    /// Builder: Set image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Free-text navigation instructions.
#[derive(Debug, Clone, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GotoPayload {
    pub instructions: String,
}

impl GotoPayload {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }
}

/// How a question expects to be answered.
#[derive(Debug, Clone, Copy, Default, Reconcile, Hydrate, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    #[default]
    Text,
    Number,
    MultipleChoice,
    Voice,
}

fn default_points() -> u32 {
    1
}

/// An assessment question.
#[derive(Debug, Clone, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    pub question: String,

    pub answer_mode: AnswerMode,

    /// Ideal or correct answer, when the question has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,

    /// Options offered for multiple-choice questions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    #[serde(default = "default_points")]
    pub points: u32,

    /// Whether the trainee must answer before moving on.
    #[serde(default)]
    pub mandatory: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl QuestionPayload {
    /// Creates a question with the given text and answer mode, worth one point.
    pub fn new(question: impl Into<String>, answer_mode: AnswerMode) -> Self {
        Self {
            question: question.into(),
            answer_mode,
            correct_answer: None,
            choices: Vec::new(),
            hint: None,
            points: default_points(),
            mandatory: false,
            image: None,
        }
    }

    /// Builder: Set the correct answer.
    pub fn with_correct_answer(mut self, answer: impl Into<String>) -> Self {
        self.correct_answer = Some(answer.into());
        self
    }

    /// Builder: Add a choice.
    pub fn with_choice(mut self, choice: impl Into<String>) -> Self {
        self.choices.push(choice.into());
        self
    }

    /// Builder: Set hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Builder: Set point value.
    pub fn with_points(mut self, points: u32) -> Self {
        self.points = points;
        self
    }

    /// Builder: Set mandatory flag.
    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    /// Builder: Set image reference.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

impl Default for QuestionPayload {
    fn default() -> Self {
        Self::new("", AnswerMode::default())
    }
}

/// Kind-specific content of a block.
///
/// On the wire this is the `kind` tag plus the `payload` object.
#[derive(Debug, Clone, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum BlockPayload {
    Information(InformationPayload),
    Goto(GotoPayload),
    Question(QuestionPayload),
}

impl BlockPayload {
    /// An empty payload of the given kind, used for freshly added blocks.
    pub fn empty(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Information => BlockPayload::Information(InformationPayload::default()),
            BlockKind::Goto => BlockPayload::Goto(GotoPayload::default()),
            BlockKind::Question => BlockPayload::Question(QuestionPayload::default()),
        }
    }

    /// The tag of this payload.
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockPayload::Information(_) => BlockKind::Information,
            BlockPayload::Goto(_) => BlockKind::Goto,
            BlockPayload::Question(_) => BlockKind::Question,
        }
    }
}

impl From<InformationPayload> for BlockPayload {
    fn from(payload: InformationPayload) -> Self {
        BlockPayload::Information(payload)
    }
}

impl From<GotoPayload> for BlockPayload {
    fn from(payload: GotoPayload) -> Self {
        BlockPayload::Goto(payload)
    }
}

impl From<QuestionPayload> for BlockPayload {
    fn from(payload: QuestionPayload) -> Self {
        BlockPayload::Question(payload)
    }
}

// =============================================================================
// BLOCK
// =============================================================================

/// One step of a training procedure.
#[derive(Debug, Clone, Reconcile, Hydrate, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// Stable identifier.
    pub id: String,

    /// Position in the owning sequence, dense from 0.
    pub order: u32,

    #[serde(flatten)]
    pub payload: BlockPayload,
}

impl Block {
    /// Creates a block with the given id and payload. `order` is assigned by
    /// the owning sequence.
    pub fn new(id: impl Into<String>, payload: impl Into<BlockPayload>) -> Self {
        Self {
            id: id.into(),
            order: 0,
            payload: payload.into(),
        }
    }

    /// Creates an empty block of the given kind with a fresh UUID.
    pub fn empty(kind: BlockKind) -> Self {
        Self::new(Uuid::new_v4().to_string(), BlockPayload::empty(kind))
    }

    pub fn kind(&self) -> BlockKind {
        self.payload.kind()
    }

    /// Point value of a question block, zero for other kinds.
    pub fn points(&self) -> u32 {
        match &self.payload {
            BlockPayload::Question(q) => q.points,
            _ => 0,
        }
    }
}

// =============================================================================
// BLOCK SEQUENCE
// =============================================================================

/// An ordered collection of blocks whose `order` values are exactly
/// `0..len`.
///
/// Every constructor renumbers, so the invariant holds for any value of this
/// type. Deserializing treats the input as persisted rows and sorts by their
/// stored `order`.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(into = "Vec<Block>")]
pub struct BlockSequence {
    blocks: Vec<Block>,
}

impl BlockSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a sequence from blocks in the given element order, ignoring
    /// their current `order` values.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut sequence = Self { blocks };
        sequence.renumber();
        sequence
    }

    /// Builds a sequence from persisted blocks, sorting by their stored
    /// `order` first. Ties keep their element order.
    pub fn from_persisted(mut blocks: Vec<Block>) -> Self {
        blocks.sort_by_key(|b| b.order);
        Self::from_blocks(blocks)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn first(&self) -> Option<&Block> {
        self.blocks.first()
    }

    /// Gets a block by id.
    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Index of the block with the given id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    /// Number of question blocks.
    pub fn question_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.kind() == BlockKind::Question)
            .count()
    }

    /// Sum of the point values of all question blocks.
    pub fn total_points(&self) -> u64 {
        self.blocks.iter().map(|b| u64::from(b.points())).sum()
    }

    /// The first id that occurs more than once, if any.
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.blocks.len());
        for block in &self.blocks {
            if !seen.insert(block.id.as_str()) {
                return Some(&block.id);
            }
        }
        None
    }

    /// Fails with `DuplicateBlockId` unless every id is distinct.
    pub fn ensure_unique_ids(&self) -> StepResult<()> {
        match self.duplicate_id() {
            Some(id) => Err(StepError::duplicate_block_id(id)),
            None => Ok(()),
        }
    }

    /// Consumes the sequence, returning its blocks.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    /// Rewrites every `order` to match the block's index.
    pub(crate) fn renumber(&mut self) {
        for (index, block) in self.blocks.iter_mut().enumerate() {
            block.order = index as u32;
        }
    }
}

impl From<Vec<Block>> for BlockSequence {
    fn from(blocks: Vec<Block>) -> Self {
        Self::from_blocks(blocks)
    }
}

impl<'de> Deserialize<'de> for BlockSequence {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Block>::deserialize(deserializer).map(Self::from_persisted)
    }
}

impl From<BlockSequence> for Vec<Block> {
    fn from(sequence: BlockSequence) -> Self {
        sequence.blocks
    }
}

impl<'a> IntoIterator for &'a BlockSequence {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_tags() {
        for kind in BlockKind::ALL {
            assert_eq!(BlockKind::from_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(BlockKind::from_tag("video"), None);
        assert_eq!(BlockKind::from_tag("Information"), None);
    }

    #[test]
    fn test_question_builder() {
        let q = QuestionPayload::new("Which valve is red?", AnswerMode::MultipleChoice)
            .with_choice("Inlet")
            .with_choice("Outlet")
            .with_correct_answer("Inlet")
            .with_points(3)
            .with_mandatory(true);

        assert_eq!(q.choices.len(), 2);
        assert_eq!(q.correct_answer.as_deref(), Some("Inlet"));
        assert_eq!(q.points, 3);
        assert!(q.mandatory);
    }

    #[test]
    fn test_block_wire_shape() {
        let block = Block::new("b1", InformationPayload::new("Wear gloves").with_image("img/gloves.png"));
        let value = serde_json::to_value(&block).unwrap();

        assert_eq!(
            value,
            json!({
                "id": "b1",
                "order": 0,
                "kind": "information",
                "payload": { "text": "Wear gloves", "image": "img/gloves.png" }
            })
        );
    }

    #[test]
    fn test_question_defaults_from_json() {
        let block: Block = serde_json::from_value(json!({
            "id": "q1",
            "kind": "question",
            "order": 4,
            "payload": { "question": "How many bolts?", "answerMode": "number" }
        }))
        .unwrap();

        match block.payload {
            BlockPayload::Question(q) => {
                assert_eq!(q.answer_mode, AnswerMode::Number);
                assert_eq!(q.points, 1);
                assert!(!q.mandatory);
                assert!(q.choices.is_empty());
            }
            other => panic!("expected question, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_sequence_renumbers_on_construction() {
        let mut a = Block::new("a", GotoPayload::new("Walk to bay 3"));
        a.order = 7;
        let mut b = Block::new("b", InformationPayload::new("Check the gauge"));
        b.order = 7;

        let sequence = BlockSequence::from_blocks(vec![a, b]);
        let orders: Vec<u32> = sequence.iter().map(|b| b.order).collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn test_from_persisted_sorts_by_order() {
        let mut a = Block::new("a", GotoPayload::new("first"));
        a.order = 5;
        let mut b = Block::new("b", GotoPayload::new("second"));
        b.order = 2;

        let sequence = BlockSequence::from_persisted(vec![a, b]);
        assert_eq!(sequence.blocks()[0].id, "b");
        assert_eq!(sequence.blocks()[0].order, 0);
        assert_eq!(sequence.blocks()[1].id, "a");
        assert_eq!(sequence.blocks()[1].order, 1);
    }

    #[test]
    fn test_points_summary() {
        let sequence = BlockSequence::from_blocks(vec![
            Block::new("i", InformationPayload::new("intro")),
            Block::new("q1", QuestionPayload::new("one", AnswerMode::Text).with_points(2)),
            Block::new("q2", QuestionPayload::new("two", AnswerMode::Voice)),
        ]);

        assert_eq!(sequence.question_count(), 2);
        assert_eq!(sequence.total_points(), 3);
    }

    #[test]
    fn test_sequence_json_is_plain_array() {
        let sequence = BlockSequence::from_blocks(vec![Block::new("g", GotoPayload::new("go"))]);
        let value = serde_json::to_value(&sequence).unwrap();
        assert!(value.is_array());

        let back: BlockSequence = serde_json::from_value(value).unwrap();
        assert_eq!(back, sequence);
    }

    #[test]
    fn test_deserialize_sorts_by_stored_order() {
        let sequence: BlockSequence = serde_json::from_value(json!([
            { "id": "b", "order": 1, "kind": "goto", "payload": { "instructions": "second" } },
            { "id": "a", "order": 0, "kind": "goto", "payload": { "instructions": "first" } }
        ]))
        .unwrap();

        let rows: Vec<(&str, u32)> = sequence.iter().map(|b| (b.id.as_str(), b.order)).collect();
        assert_eq!(rows, vec![("a", 0), ("b", 1)]);
    }

    #[test]
    fn test_total_points_does_not_overflow() {
        let sequence = BlockSequence::from_blocks(vec![
            Block::new("q1", QuestionPayload::new("one", AnswerMode::Text).with_points(u32::MAX)),
            Block::new("q2", QuestionPayload::new("two", AnswerMode::Text).with_points(1)),
        ]);

        assert_eq!(sequence.total_points(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn test_duplicate_id() {
        let unique = BlockSequence::from_blocks(vec![
            Block::new("a", GotoPayload::new("go")),
            Block::new("b", GotoPayload::new("go")),
        ]);
        assert_eq!(unique.duplicate_id(), None);

        let repeated = BlockSequence::from_blocks(vec![
            Block::new("a", GotoPayload::new("go")),
            Block::new("b", GotoPayload::new("go")),
            Block::new("a", InformationPayload::new("again")),
        ]);
        assert_eq!(repeated.duplicate_id(), Some("a"));
        assert!(matches!(
            repeated.ensure_unique_ids(),
            Err(StepError::DuplicateBlockId(id)) if id == "a"
        ));
    }
}
