use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            content,
        }
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Page-ordered text of one uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedText {
    pub filename: String,
    pub text: String,
    pub pages: usize,
    /// Assigned by the session when the text becomes current; 0 until then.
    pub version: u64,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    /// Version of the document an assistant reply was answered from.
    pub document_version: Option<u64>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            document_version: None,
        }
    }

    pub fn assistant(text: impl Into<String>, document_version: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            text: text.into(),
            document_version: Some(document_version),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Fully composed payload for one question. Built per send, never stored.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub messages: Vec<ChatMessage>,
    pub document_version: u64,
}

// Wire types for the OpenAI-compatible chat completions endpoint

#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub error: String,
}
