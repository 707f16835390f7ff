use thiserror::Error;

/// Failures surfaced by the extraction pipeline.
///
/// Page-level variants (`UnreadablePage`, `RecognitionEngine`) are degraded by
/// the page extractor; document-level variants abort one document or archive
/// member.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedKind(String),

    #[error("page {page} is unreadable: {reason}")]
    UnreadablePage { page: u32, reason: String },

    #[error("no documents found")]
    EmptyArchive,

    #[error("recognition engine failed: {0}")]
    RecognitionEngine(String),

    #[error("document could not be opened: {0}")]
    CorruptDocument(String),

    #[error("archive could not be read: {0}")]
    Archive(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("extraction cancelled")]
    Cancelled,

    #[error("job timeout of {0}s exceeded")]
    Timeout(u64),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    /// Errors that only cost a single page its text.
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            ExtractError::UnreadablePage { .. } | ExtractError::RecognitionEngine(_)
        )
    }

    /// Errors that end the whole job, not just the current document.
    pub fn is_job_level(&self) -> bool {
        matches!(self, ExtractError::Cancelled | ExtractError::Timeout(_))
    }
}
