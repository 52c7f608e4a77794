use crate::chat_response::*;
use crate::query_payload::QueryPayload;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use docchat::{ChatSession, DocChatError, ErrorResponse, OpenAiService, UploadedDocument};
use std::sync::Arc;

pub type AppState = Arc<ChatSession<OpenAiService>>;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            status: "error".to_string(),
            error: error.to_string(),
        }),
    )
}

pub fn status_for(err: &DocChatError) -> StatusCode {
    match err {
        DocChatError::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        DocChatError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        DocChatError::ExtractionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DocChatError::MissingInput(_) => StatusCode::BAD_REQUEST,
        DocChatError::Busy | DocChatError::Superseded { .. } => StatusCode::CONFLICT,
        DocChatError::ProviderError(_) | DocChatError::EmptyResponse => StatusCode::BAD_GATEWAY,
        DocChatError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn from_pipeline(err: DocChatError) -> ApiError {
    error_response(status_for(&err), err)
}

pub async fn handle_upload(State(session): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let mut document = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_response(e.status(), e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let content = field
            .bytes()
            .await
            .map_err(|e| error_response(e.status(), e.body_text()))?;

        document = Some(UploadedDocument::new(filename, mime_type, content.to_vec()));
        break;
    }

    let document = document.ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "multipart field 'file' is required"))?;

    let extracted = session.upload(document).await.map_err(from_pipeline)?;

    Ok(Json(UploadResponse {
        status: "success".to_string(),
        filename: extracted.filename.clone(),
        pages: extracted.pages,
        characters: extracted.text.chars().count(),
        version: extracted.version,
    }))
}

pub async fn handle_query(
    State(session): State<AppState>,
    Json(payload): Json<QueryPayload>,
) -> Result<Json<QueryResponse>, ApiError> {
    let exchange = session.send(&payload.message).await.map_err(from_pipeline)?;

    Ok(Json(QueryResponse {
        status: "success".to_string(),
        reply: exchange.reply.text.clone(),
        turns: vec![exchange.question, exchange.reply],
    }))
}

pub async fn handle_conversation(State(session): State<AppState>) -> Json<ConversationResponse> {
    Json(ConversationResponse {
        turns: session.conversation().await,
    })
}

pub async fn handle_health(State(session): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        document_loaded: session.document().await.is_some(),
    })
}
