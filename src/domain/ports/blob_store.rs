//! Port abstraction for attachment blob storage adapters.

use async_trait::async_trait;

/// An uploaded file ready to be written to blob storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Client-supplied file name; adapters sanitise it before use.
    pub original_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Errors raised by blob store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobStoreError {
    /// Upload exceeds the configured size limit.
    #[error("file exceeds the {limit_bytes} byte upload limit")]
    TooLarge { limit_bytes: usize },
    /// Upload has a file type outside the allow-list.
    #[error("unsupported file type `{extension}`")]
    UnsupportedType { extension: String },
    /// The storage backend failed while writing.
    #[error("blob storage failed: {message}")]
    Storage { message: String },
}

impl BlobStoreError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// Port for persisting ticket attachments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persist an upload and return the stored path exposed to clients.
    async fn store(&self, upload: FileUpload) -> Result<String, BlobStoreError>;
}
