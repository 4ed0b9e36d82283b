//! Generation requests and the prompts built from them.

use serde::{Deserialize, Serialize};

/// Default number of steps asked for when the caller does not choose one.
pub const DEFAULT_STEP_COUNT: u32 = 8;

/// Everything needed to ask the collaborator for a block sequence.
///
/// Kept verbatim by the orchestrator so it can be replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Topics the procedure should cover.
    pub topics: Vec<String>,

    /// Desired number of blocks.
    pub step_count: u32,

    /// Extracted text of the source document.
    pub source_content: String,

    /// Name of the source document, for context only.
    pub file_name: String,

    /// Output of an earlier analysis pass over the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

impl GenerationRequest {
    /// Creates a request for the given document with no topics and the
    /// default step count.
    pub fn new(source_content: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            topics: Vec::new(),
            step_count: DEFAULT_STEP_COUNT,
            source_content: source_content.into(),
            file_name: file_name.into(),
            analysis: None,
        }
    }

    /// Builder: Add a topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topics.push(topic.into());
        self
    }

    /// Builder: Replace the topic list.
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Builder: Set desired step count.
    pub fn with_step_count(mut self, step_count: u32) -> Self {
        self.step_count = step_count;
        self
    }

    /// Builder: Set prior analysis text.
    pub fn with_analysis(mut self, analysis: impl Into<String>) -> Self {
        self.analysis = Some(analysis.into());
        self
    }

    /// Builds the chat prompt for this request.
    pub fn to_prompt(&self) -> Prompt {
        let mut user = String::new();

        user.push_str(&format!(
            "Create a training procedure of exactly {} steps from the document \"{}\".\n",
            self.step_count, self.file_name
        ));
        if !self.topics.is_empty() {
            user.push_str(&format!("Focus on these topics: {}.\n", self.topics.join(", ")));
        }
        if let Some(analysis) = self.analysis.as_deref().filter(|a| !a.trim().is_empty()) {
            user.push_str("\nPrevious analysis of the document:\n");
            user.push_str(analysis);
            user.push('\n');
        }
        user.push_str("\nDocument content:\n");
        user.push_str(&self.source_content);

        Prompt {
            system: SYSTEM_PROMPT.to_string(),
            user,
        }
    }
}

/// A two-message chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const SYSTEM_PROMPT: &str = r#"You design step-by-step training procedures.
Answer with a single JSON object and nothing else, shaped as:
{"blocks": [
  {"id": "<unique string>", "kind": "information", "order": 0,
   "payload": {"text": "<content>", "image": "<optional reference>"}},
  {"id": "<unique string>", "kind": "goto", "order": 1,
   "payload": {"instructions": "<where to go>"}},
  {"id": "<unique string>", "kind": "question", "order": 2,
   "payload": {"question": "<text>", "answerMode": "text|number|multiple_choice|voice",
               "correctAnswer": "<optional>", "choices": ["<for multiple_choice>"],
               "hint": "<optional>", "points": 1, "mandatory": false}}
]}
Mix the three kinds as the material requires. Keep every id unique."#;
