use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short text note.
///
/// `id` and `created_at` are stamped by the store when the note is created
/// and never change afterwards. Only `title` and `content` are editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Overwrite the editable fields, leaving identity untouched.
    pub fn apply(&mut self, input: NoteInput) {
        self.title = input.title;
        self.content = input.content;
    }
}

/// Input for creating or replacing a note.
///
/// Any `id` or `createdAt` sent by a client is ignored during deserialization.
/// Missing fields decode as empty strings so they surface as validation
/// errors rather than decoding failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl NoteInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Check that both fields carry text.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.is_empty() {
            return Err("title cannot be empty");
        }
        if self.content.is_empty() {
            return Err("content cannot be empty");
        }
        Ok(())
    }
}
