use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocChatError>;

/// Shown in place of an answer when the provider call fails.
pub const APOLOGY_MESSAGE: &str =
    "An error occurred while processing your request. Please try again later.";

#[derive(Debug, Error)]
pub enum DocChatError {
    // Upload validation
    #[error("Please upload a valid PDF file. (got '{mime_type}')")]
    UnsupportedType { mime_type: String },

    #[error("File size exceeds {} limit. ({size} bytes)", format_limit(.limit))]
    TooLarge { size: u64, limit: u64 },

    // Extraction
    #[error("Failed to extract text from PDF: {0}")]
    ExtractionFailed(String),

    // Composition
    #[error("Invalid input: {0} is required")]
    MissingInput(&'static str),

    // Provider
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider returned no choices")]
    EmptyResponse,

    // Session
    #[error("A question is already being answered for this session")]
    Busy,

    #[error("Upload v{version} was superseded by a newer upload")]
    Superseded { version: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DocChatError {
    /// Validation failures the user can fix by picking another file.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::UnsupportedType { .. } | Self::TooLarge { .. })
    }

    /// Remote failures that are reported as an in-conversation apology.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::ProviderError(_) | Self::EmptyResponse)
    }
}

const MIB: u64 = 1024 * 1024;

// Whole mebibytes read as "10MB"; anything else is rounded up, or shown in
// bytes below one mebibyte.
fn format_limit(limit: &u64) -> String {
    if *limit < MIB {
        format!("{} bytes", limit)
    } else {
        format!("{}MB", limit.div_ceil(MIB))
    }
}

impl From<reqwest::Error> for DocChatError {
    fn from(err: reqwest::Error) -> Self {
        Self::ProviderError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_large_reports_limit_in_megabytes() {
        let e = DocChatError::TooLarge {
            size: 11 * 1024 * 1024,
            limit: 10 * 1024 * 1024,
        };
        let msg = e.to_string();
        assert!(msg.contains("10MB"), "got: {msg}");
        assert!(msg.contains("11534336"), "got: {msg}");
    }

    #[test]
    fn too_large_below_one_megabyte_uses_bytes() {
        let e = DocChatError::TooLarge { size: 600_000, limit: 512_000 };
        let msg = e.to_string();
        assert!(msg.contains("512000 bytes limit"), "got: {msg}");
        assert!(!msg.contains("0MB"), "got: {msg}");
    }

    #[test]
    fn too_large_rounds_partial_megabytes_up() {
        let e = DocChatError::TooLarge { size: 3 * MIB, limit: 2 * MIB + 1 };
        assert!(e.to_string().contains("3MB limit"), "got: {e}");
    }

    #[test]
    fn classification() {
        assert!(DocChatError::UnsupportedType { mime_type: "text/plain".into() }.is_user_correctable());
        assert!(!DocChatError::ExtractionFailed("bad xref".into()).is_user_correctable());
        assert!(DocChatError::EmptyResponse.is_provider_failure());
        assert!(DocChatError::ProviderError("timeout".into()).is_provider_failure());
        assert!(!DocChatError::MissingInput("user message").is_provider_failure());
    }
}
