use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::error::{DocChatError, Result};
use crate::models::*;
use std::future::Future;

/// Gatekeeper run before any bytes reach the PDF parser.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_bytes: u64,
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl FileValidator {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Checks the declared MIME type first, then the size. The type is
    /// taken at face value; the content is not sniffed.
    pub fn validate(&self, mime_type: &str, size: u64) -> Result<()> {
        if mime_type != PDF_MIME_TYPE {
            return Err(DocChatError::UnsupportedType {
                mime_type: mime_type.to_string(),
            });
        }

        if size > self.max_bytes {
            return Err(DocChatError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        Ok(())
    }

    pub fn validate_document(&self, document: &UploadedDocument) -> Result<()> {
        self.validate(&document.mime_type, document.size())
    }
}

/// A paginated document whose pages can be read one at a time.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Text runs of a page, in reading order. `page` is 1-based.
    fn page_runs(&self, page: usize) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// PDF pages parsed with `pdf-extract`.
///
/// `pdf-extract` returns each page as one string, typically starting with
/// blank lines (`"\n\nHello"`). A page's runs are its non-blank lines,
/// trimmed, followed by one empty end-of-line run, so "Hello" reads as
/// `"Hello "`.
pub struct PdfPages {
    pages: Vec<String>,
}

impl PdfPages {
    /// Parses the whole document on the blocking pool. Parser panics on
    /// malformed input are reported as extraction failures.
    pub async fn load(content: Vec<u8>) -> Result<Self> {
        let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&content))
            .await
            .map_err(|e| DocChatError::ExtractionFailed(format!("PDF parser aborted: {}", e)))?
            .map_err(|e| DocChatError::ExtractionFailed(e.to_string()))?;

        Ok(Self { pages })
    }
}

impl PageSource for PdfPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    async fn page_runs(&self, page: usize) -> Result<Vec<String>> {
        let text = page
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx))
            .ok_or_else(|| DocChatError::ExtractionFailed(format!("page {} out of range", page)))?;

        Ok(page_text_runs(text))
    }
}

fn page_text_runs(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .chain(std::iter::once(String::new()))
        .collect()
}

pub struct TextExtractor;

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extracts the text of an already validated upload.
    pub async fn extract(&self, document: UploadedDocument) -> Result<ExtractedText> {
        log::info!("Processing PDF: {} ({} bytes)", document.filename, document.size());

        let source = PdfPages::load(document.content).await?;
        self.extract_from(&source, &document.filename).await
    }

    /// Reads pages 1..=N strictly in order. Each page contributes its runs
    /// joined by a single space, followed by a newline.
    pub async fn extract_from<S: PageSource + Sync>(&self, source: &S, filename: &str) -> Result<ExtractedText> {
        let pages = source.page_count();
        let mut text = String::new();

        for page in 1..=pages {
            let runs = source.page_runs(page).await?;
            text.push_str(&runs.join(" "));
            text.push('\n');
            log::debug!("Extracted page {}/{} of {}", page, pages, filename);
        }

        log::info!("Extracted {} pages ({} chars) from {}", pages, text.chars().count(), filename);

        Ok(ExtractedText {
            filename: filename.to_string(),
            text,
            pages,
            version: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FakePages {
        pages: Vec<Vec<&'static str>>,
        fail_on: Option<usize>,
        visited: Mutex<Vec<usize>>,
    }

    impl FakePages {
        fn new(pages: Vec<Vec<&'static str>>) -> Self {
            Self {
                pages,
                fail_on: None,
                visited: Mutex::new(Vec::new()),
            }
        }
    }

    impl PageSource for FakePages {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        async fn page_runs(&self, page: usize) -> Result<Vec<String>> {
            self.visited.lock().unwrap().push(page);
            if self.fail_on == Some(page) {
                return Err(DocChatError::ExtractionFailed("encrypted content stream".into()));
            }
            tokio::task::yield_now().await;
            Ok(self.pages[page - 1].iter().map(|s| s.to_string()).collect())
        }
    }

    #[test]
    fn rejects_non_pdf_types() {
        let validator = FileValidator::default();
        for mime in ["text/plain", "application/PDF", "application/pdf; charset=binary", "", "image/png"] {
            let err = validator.validate(mime, 10).unwrap_err();
            assert!(matches!(err, DocChatError::UnsupportedType { .. }), "mime {mime:?}");
        }
    }

    #[test]
    fn size_limit_is_inclusive() {
        let validator = FileValidator::default();
        assert!(validator.validate(PDF_MIME_TYPE, 10_485_760).is_ok());
        assert!(validator.validate(PDF_MIME_TYPE, 0).is_ok());
        let err = validator.validate(PDF_MIME_TYPE, 10_485_761).unwrap_err();
        assert!(matches!(err, DocChatError::TooLarge { size: 10_485_761, limit: 10_485_760 }));
    }

    #[test]
    fn type_checked_before_size() {
        let validator = FileValidator::default();
        let err = validator.validate("image/png", 50 * 1024 * 1024).unwrap_err();
        assert!(matches!(err, DocChatError::UnsupportedType { .. }));
    }

    #[test]
    fn custom_limit() {
        let validator = FileValidator::new(1024);
        let doc = UploadedDocument::new("a.pdf", PDF_MIME_TYPE, vec![0u8; 2048]);
        assert!(validator.validate_document(&doc).unwrap_err().is_user_correctable());
    }

    #[tokio::test]
    async fn joins_runs_with_spaces_and_pages_with_newlines() {
        let source = FakePages::new(vec![vec!["Hello", ""], vec!["World", ""]]);
        let extracted = TextExtractor::new().extract_from(&source, "two.pdf").await.unwrap();

        assert_eq!(extracted.text, "Hello \nWorld \n");
        assert_eq!(extracted.pages, 2);
        assert_eq!(extracted.filename, "two.pdf");
    }

    #[tokio::test]
    async fn pages_read_in_order() {
        let source = FakePages::new(vec![vec!["one", "a"], vec!["two"], vec![], vec!["four", "b", "c"]]);
        let extracted = TextExtractor::new().extract_from(&source, "four.pdf").await.unwrap();

        assert_eq!(*source.visited.lock().unwrap(), vec![1, 2, 3, 4]);
        let segments: Vec<&str> = extracted.text.split_terminator('\n').collect();
        assert_eq!(segments, vec!["one a", "two", "", "four b c"]);
        assert_eq!(extracted.text.matches('\n').count(), 4);
    }

    #[tokio::test]
    async fn zero_pages_is_empty_text() {
        let source = FakePages::new(vec![]);
        let extracted = TextExtractor::new().extract_from(&source, "empty.pdf").await.unwrap();

        assert_eq!(extracted.text, "");
        assert_eq!(extracted.pages, 0);
        assert!(extracted.is_empty());
    }

    #[tokio::test]
    async fn page_failure_stops_extraction() {
        let mut source = FakePages::new(vec![vec!["a"], vec!["b"], vec!["c"]]);
        source.fail_on = Some(2);
        let err = TextExtractor::new().extract_from(&source, "locked.pdf").await.unwrap_err();

        assert!(matches!(err, DocChatError::ExtractionFailed(_)));
        assert_eq!(*source.visited.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn page_runs_skip_blank_lines() {
        assert_eq!(page_text_runs("\n\nHello"), vec!["Hello", ""]);
        assert_eq!(page_text_runs("Hello\n"), vec!["Hello", ""]);
        assert_eq!(page_text_runs("\n\n  Title \n\n\nBody text\r\n"), vec!["Title", "Body text", ""]);
        assert_eq!(page_text_runs(""), vec![""]);
        assert_eq!(page_text_runs(" \n\t\n"), vec![""]);
    }

    #[tokio::test]
    async fn pdf_pages_as_returned_by_pdf_extract() {
        let source = PdfPages {
            pages: vec!["\n\nHello".to_string(), "\n\nWorld".to_string()],
        };
        assert_eq!(source.page_runs(1).await.unwrap(), vec!["Hello", ""]);
        assert!(source.page_runs(0).await.is_err());
        assert!(source.page_runs(3).await.is_err());

        let extracted = TextExtractor::new().extract_from(&source, "x.pdf").await.unwrap();
        assert_eq!(extracted.text, "Hello \nWorld \n");
    }

    #[tokio::test]
    async fn garbage_bytes_fail_extraction() {
        let doc = UploadedDocument::new("junk.pdf", PDF_MIME_TYPE, b"definitely not a pdf".to_vec());
        let err = TextExtractor::new().extract(doc).await.unwrap_err();
        assert!(matches!(err, DocChatError::ExtractionFailed(_)));
    }
}
