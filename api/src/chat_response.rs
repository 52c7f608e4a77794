use docchat::ConversationTurn;
use serde::Serialize;

#[derive(Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub filename: String,
    pub pages: usize,
    pub characters: usize,
    pub version: u64,
}

#[derive(Serialize)]
pub struct QueryResponse {
    pub status: String,
    pub reply: String,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Serialize)]
pub struct ConversationResponse {
    pub turns: Vec<ConversationTurn>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub document_loaded: bool,
}
