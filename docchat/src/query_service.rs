use crate::conversation::ConversationStore;
use crate::document_processor::{FileValidator, TextExtractor};
use crate::error::{DocChatError, Result, APOLOGY_MESSAGE};
use crate::models::*;
use crate::openai_service::Completion;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

const SYSTEM_PROMPT: &str = "You are an AI assistant trained to analyze documents and assist users in \
understanding the content with a professional and psychologically supportive approach. Answer their \
queries briefly, in no more than 2 to 3 lines, unless they ask you to elaborate or use keywords like \
'Explain', 'in details', 'elaborate' or 'understand'.";

pub struct QueryComposer;

impl QueryComposer {
    /// Wraps the document text and the question in the fixed instructions.
    /// Both inputs are embedded verbatim.
    pub fn compose(document: &ExtractedText, message: &str) -> Result<QueryRequest> {
        if document.is_empty() {
            return Err(DocChatError::MissingInput("document content"));
        }
        if message.trim().is_empty() {
            return Err(DocChatError::MissingInput("user message"));
        }

        Ok(QueryRequest {
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: Self::build_prompt(&document.text, message),
                },
            ],
            document_version: document.version,
        })
    }

    fn build_prompt(document: &str, query: &str) -> String {
        format!(
            r#"Document Content: """{document}"""
User Query: """{query}"""

You are a highly intelligent AI assistant specializing in extracting insights from documents.
Your task is to analyze the provided content and respond professionally, ensuring clarity and accuracy.
If the query is vague, ask for clarification. If the answer is not in the document, state that explicitly.
Respond in a structured format where needed."#
        )
    }
}

/// Result of a send: the user turn and the reply recorded for it.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub question: ConversationTurn,
    pub reply: ConversationTurn,
    /// Set when the reply is the apology rather than a model answer.
    pub failure: Option<String>,
}

struct SessionState {
    document: Option<Arc<ExtractedText>>,
    conversation: ConversationStore,
    next_version: u64,
}

/// One user's document and chat history.
///
/// Uploads replace the current text atomically once extraction succeeds.
/// A send works on the snapshot it captured when it started, so an upload
/// finishing mid-send never changes that answer; the reply carries the
/// snapshot's version. Only one send may be in flight at a time.
pub struct ChatSession<C> {
    client: C,
    validator: FileValidator,
    extractor: TextExtractor,
    state: RwLock<SessionState>,
    sending: AtomicBool,
}

struct SendGuard<'a>(&'a AtomicBool);

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C: Completion + Sync> ChatSession<C> {
    pub fn new(client: C, validator: FileValidator) -> Self {
        Self {
            client,
            validator,
            extractor: TextExtractor::new(),
            state: RwLock::new(SessionState {
                document: None,
                conversation: ConversationStore::new(),
                next_version: 1,
            }),
            sending: AtomicBool::new(false),
        }
    }

    /// Validates and extracts an upload, then makes it the current document.
    ///
    /// The version is taken when the upload starts. If a later upload has
    /// already become current by the time extraction finishes, this one is
    /// dropped with [`DocChatError::Superseded`].
    pub async fn upload(&self, document: UploadedDocument) -> Result<Arc<ExtractedText>> {
        if let Err(e) = self.validator.validate_document(&document) {
            log::warn!("Rejected upload {}: {}", document.filename, e);
            return Err(e);
        }

        let version = self.begin_upload().await;
        let extracted = self.extractor.extract(document).await?;
        self.commit_upload(version, extracted).await
    }

    async fn begin_upload(&self) -> u64 {
        let mut state = self.state.write().await;
        let version = state.next_version;
        state.next_version += 1;
        version
    }

    async fn commit_upload(&self, version: u64, mut extracted: ExtractedText) -> Result<Arc<ExtractedText>> {
        let mut state = self.state.write().await;
        if let Some(current) = &state.document {
            if current.version > version {
                log::info!(
                    "Discarding {} (v{}): v{} is already current",
                    extracted.filename,
                    version,
                    current.version
                );
                return Err(DocChatError::Superseded { version });
            }
        }

        extracted.version = version;
        let extracted = Arc::new(extracted);
        state.document = Some(extracted.clone());

        log::info!("Document {} is now current (v{})", extracted.filename, extracted.version);
        Ok(extracted)
    }

    /// Answers one question against the current document.
    ///
    /// Missing input fails before any remote call and records nothing.
    /// Provider failures are recorded as the apology reply and reported in
    /// [`Exchange::failure`].
    pub async fn send(&self, message: &str) -> Result<Exchange> {
        if self.sending.swap(true, Ordering::AcqRel) {
            return Err(DocChatError::Busy);
        }
        let _guard = SendGuard(&self.sending);

        let snapshot = self.state.read().await.document.clone();
        let request = match snapshot.as_deref() {
            Some(document) => QueryComposer::compose(document, message)?,
            None => return Err(DocChatError::MissingInput("document content")),
        };

        let (answer, failure) = match self.client.complete(&request).await {
            Ok(answer) => (answer, None),
            Err(e) if e.is_provider_failure() => {
                log::warn!("Completion failed: {}", e);
                (APOLOGY_MESSAGE.to_string(), Some(e.to_string()))
            }
            Err(e) => return Err(e),
        };

        let question = ConversationTurn::user(message);
        let reply = ConversationTurn::assistant(answer, request.document_version);

        let mut state = self.state.write().await;
        state.conversation.append(question.clone());
        state.conversation.append(reply.clone());

        Ok(Exchange {
            question,
            reply,
            failure,
        })
    }

    pub async fn conversation(&self) -> Vec<ConversationTurn> {
        self.state.read().await.conversation.list().to_vec()
    }

    pub async fn document(&self) -> Option<Arc<ExtractedText>> {
        self.state.read().await.document.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }
}
