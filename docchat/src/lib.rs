pub mod config;
pub mod conversation;
pub mod document_processor;
pub mod error;
pub mod models;
pub mod openai_service;
pub mod query_service;

pub use config::{Config, GenerationConfig};
pub use conversation::ConversationStore;
pub use document_processor::{FileValidator, PageSource, PdfPages, TextExtractor};
pub use error::{DocChatError, Result, APOLOGY_MESSAGE};
pub use models::*;
pub use openai_service::{Completion, OpenAiService};
pub use query_service::{ChatSession, Exchange, QueryComposer};
