//! Response validation: untrusted completion text in, trusted sequence out.
//!
//! The policy is all-or-nothing. A single malformed element rejects the whole
//! batch; nothing is repaired or partially accepted.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::client::ChatCompletion;
use crate::error::GenerationError;
use crate::sequence::model::{
    Block, BlockKind, BlockPayload, BlockSequence, GotoPayload, InformationPayload,
    QuestionPayload,
};

/// Outcome of a generation: a trusted sequence or a typed failure.
pub type GenerationResult = Result<BlockSequence, GenerationError>;

/// Validates a chat completion, reading the first candidate.
pub fn validate_response(response: &ChatCompletion) -> GenerationResult {
    let text = response
        .first_content()
        .ok_or(GenerationError::EmptyResponse)?;
    validate_text(text)
}

/// Validates raw candidate text.
pub fn validate_text(text: &str) -> GenerationResult {
    let json = extract_json(text);
    let value: Value =
        serde_json::from_str(json).map_err(|e| GenerationError::malformed_json(e.to_string()))?;

    let elements = value
        .get("blocks")
        .and_then(Value::as_array)
        .ok_or(GenerationError::MissingBlocksField)?;

    let mut seen = HashSet::with_capacity(elements.len());
    let mut blocks = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let block = parse_block(index, element)?;
        if !seen.insert(block.id.clone()) {
            return Err(GenerationError::invalid_block(
                index,
                format!("duplicate id `{}`", block.id),
            ));
        }
        blocks.push(block);
    }

    debug!(blocks = blocks.len(), "validated generation response");
    // Element order wins over whatever `order` values the model emitted.
    Ok(BlockSequence::from_blocks(blocks))
}

/// Slices from the first `{` to the last `}` inclusive, dropping any prose
/// around the object. Falls back to the full text when no such span exists.
fn extract_json(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

fn parse_block(index: usize, element: &Value) -> Result<Block, GenerationError> {
    let fields = element
        .as_object()
        .ok_or_else(|| GenerationError::invalid_block(index, "block is not an object"))?;

    let id = fields
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GenerationError::invalid_block(index, "missing or non-string `id`"))?;

    let tag = fields
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| GenerationError::invalid_block(index, "missing or non-string `kind`"))?;
    let kind = BlockKind::from_tag(tag)
        .ok_or_else(|| GenerationError::invalid_block(index, format!("unknown kind `{}`", tag)))?;

    if !fields.get("order").is_some_and(Value::is_number) {
        return Err(GenerationError::invalid_block(
            index,
            "missing or non-numeric `order`",
        ));
    }

    let payload = fields
        .get("payload")
        .and_then(Value::as_object)
        .ok_or_else(|| GenerationError::invalid_block(index, "missing `payload` object"))?;

    let payload = match kind {
        BlockKind::Information => {
            BlockPayload::Information(parse_payload::<InformationPayload>(index, kind, payload)?)
        }
        BlockKind::Goto => BlockPayload::Goto(parse_payload::<GotoPayload>(index, kind, payload)?),
        BlockKind::Question => {
            BlockPayload::Question(parse_payload::<QuestionPayload>(index, kind, payload)?)
        }
    };

    Ok(Block::new(id, payload))
}

fn parse_payload<T: DeserializeOwned>(
    index: usize,
    kind: BlockKind,
    payload: &Map<String, Value>,
) -> Result<T, GenerationError> {
    serde_json::from_value(Value::Object(payload.clone())).map_err(|e| {
        GenerationError::invalid_block(index, format!("invalid {} payload: {}", kind, e))
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::model::AnswerMode;
    use serde_json::json;

    fn info(id: &str, order: i64) -> Value {
        json!({
            "id": id,
            "kind": "information",
            "order": order,
            "payload": { "text": format!("text of {}", id) }
        })
    }

    #[test]
    fn test_prose_around_object() {
        let text = "Sure! Here you go: {\"blocks\":[{\"id\":\"a\",\"kind\":\"information\",\"order\":5,\"payload\":{\"text\":\"Hello\"}}]} Let me know if you need more.";

        let sequence = validate_text(text).unwrap();

        assert_eq!(sequence.len(), 1);
        let block = &sequence.blocks()[0];
        assert_eq!(block.id, "a");
        assert_eq!(block.order, 0);
        assert_eq!(block.payload, BlockPayload::from(InformationPayload::new("Hello")));
    }

    #[test]
    fn test_missing_blocks_field() {
        assert_eq!(
            validate_text("{\"nope\": []}"),
            Err(GenerationError::MissingBlocksField)
        );
    }

    #[test]
    fn test_blocks_not_an_array() {
        assert_eq!(
            validate_text("{\"blocks\": {\"id\": \"a\"}}"),
            Err(GenerationError::MissingBlocksField)
        );
    }

    #[test]
    fn test_malformed_json_keeps_diagnostic() {
        match validate_text("Here: {\"blocks\": [ }") {
            Err(GenerationError::MalformedJson(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected MalformedJson, got {:?}", other),
        }
    }

    #[test]
    fn test_no_braces_parses_full_text() {
        assert!(matches!(
            validate_text("I cannot help with that."),
            Err(GenerationError::MalformedJson(_))
        ));
        // Bare top-level array: no braces span, parsed as-is, lacks `blocks`.
        assert_eq!(validate_text("[]"), Err(GenerationError::MissingBlocksField));
    }

    #[test]
    fn test_empty_blocks_is_valid() {
        let sequence = validate_text("{\"blocks\": []}").unwrap();
        assert!(sequence.is_empty());
    }

    #[test]
    fn test_orders_renumbered_in_array_order() {
        let text = json!({ "blocks": [info("x", 9), info("y", 2), info("z", 2)] }).to_string();

        let sequence = validate_text(&text).unwrap();

        let ids: Vec<&str> = sequence.iter().map(|b| b.id.as_str()).collect();
        let orders: Vec<u32> = sequence.iter().map(|b| b.order).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_one_bad_block_rejects_all() {
        let bad = json!({ "id": "b", "kind": "video", "order": 1, "payload": {} });
        let text = json!({ "blocks": [info("a", 0), bad, info("c", 2)] }).to_string();

        match validate_text(&text) {
            Err(GenerationError::InvalidBlockShape { index, reason }) => {
                assert_eq!(index, 1);
                assert!(reason.contains("video"));
            }
            other => panic!("expected InvalidBlockShape, got {:?}", other),
        }
    }

    #[test]
    fn test_shape_checks() {
        let cases = vec![
            (json!("just a string"), "not an object"),
            (json!({ "kind": "goto", "order": 0, "payload": { "instructions": "go" } }), "`id`"),
            (json!({ "id": 7, "kind": "goto", "order": 0, "payload": { "instructions": "go" } }), "`id`"),
            (json!({ "id": "", "kind": "goto", "order": 0, "payload": { "instructions": "go" } }), "`id`"),
            (json!({ "id": "g", "order": 0, "payload": { "instructions": "go" } }), "`kind`"),
            (json!({ "id": "g", "kind": "goto", "order": "0", "payload": { "instructions": "go" } }), "`order`"),
            (json!({ "id": "g", "kind": "goto", "payload": { "instructions": "go" } }), "`order`"),
            (json!({ "id": "g", "kind": "goto", "order": 0 }), "`payload`"),
            (json!({ "id": "g", "kind": "goto", "order": 0, "payload": null }), "`payload`"),
            (json!({ "id": "g", "kind": "goto", "order": 0, "payload": { "text": "wrong field" } }), "goto payload"),
            (
                json!({ "id": "q", "kind": "question", "order": 0, "payload": { "question": "?", "answerMode": "telepathy" } }),
                "question payload",
            ),
        ];

        for (element, expected) in cases {
            let text = json!({ "blocks": [element.clone()] }).to_string();
            match validate_text(&text) {
                Err(GenerationError::InvalidBlockShape { index, reason }) => {
                    assert_eq!(index, 0);
                    assert!(
                        reason.contains(expected),
                        "reason `{}` for {} should mention `{}`",
                        reason,
                        element,
                        expected
                    );
                }
                other => panic!("expected InvalidBlockShape for {}, got {:?}", element, other),
            }
        }
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let text = json!({ "blocks": [info("a", 0), info("a", 1)] }).to_string();
        assert!(matches!(
            validate_text(&text),
            Err(GenerationError::InvalidBlockShape { index: 1, .. })
        ));
    }

    #[test]
    fn test_round_trip_through_serializer() {
        let original = BlockSequence::from_blocks(vec![
            Block::new("i", InformationPayload::new("Welcome").with_image("welcome.png")),
            Block::new("g", GotoPayload::new("Walk to the loading dock")),
            Block::new(
                "q",
                QuestionPayload::new("Max load in kg?", AnswerMode::Number)
                    .with_correct_answer("500")
                    .with_hint("See the plate on the forklift")
                    .with_points(4)
                    .with_mandatory(true),
            ),
            Block::new(
                "m",
                QuestionPayload::new("Pick the PPE", AnswerMode::MultipleChoice)
                    .with_choice("Helmet")
                    .with_choice("Sandals"),
            ),
        ]);

        let text = json!({ "blocks": original }).to_string();
        let validated = validate_text(&text).unwrap();

        assert_eq!(validated, original);
    }

    #[test]
    fn test_empty_completion() {
        assert_eq!(
            validate_response(&ChatCompletion::default()),
            Err(GenerationError::EmptyResponse)
        );
    }

    #[test]
    fn test_uses_first_candidate() {
        let response = ChatCompletion::from_texts([
            "{\"blocks\": []}",
            "{\"blocks\": [not even json",
        ]);
        assert!(validate_response(&response).unwrap().is_empty());
    }
}
