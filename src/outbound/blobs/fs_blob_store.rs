//! Filesystem implementation of the blob store port.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use crate::domain::ports::{BlobStore, BlobStoreError, FileUpload};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// File extensions accepted for ticket attachments.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "pdf", "doc", "docx", "xls", "xlsx", "txt",
];

/// Blob store writing uploads under a configured directory.
///
/// Stored names are `<millis>-<sanitised original name>`, so listings sort
/// chronologically and client-supplied names cannot traverse directories.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    dir: PathBuf,
    public_prefix: String,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: "/uploads".to_owned(),
        }
    }
}

fn sanitise(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    // Strip any leading dots so a name can never become a hidden file or
    // a relative path component.
    cleaned.trim_start_matches('.').to_owned()
}

fn validate(upload: &FileUpload) -> Result<(), BlobStoreError> {
    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(BlobStoreError::TooLarge {
            limit_bytes: MAX_UPLOAD_BYTES,
        });
    }
    let extension = upload
        .original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(BlobStoreError::UnsupportedType { extension });
    }
    Ok(())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, upload: FileUpload) -> Result<String, BlobStoreError> {
        validate(&upload)?;
        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitise(&upload.original_name)
        );
        let path = self.dir.join(&file_name);

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| BlobStoreError::storage(err.to_string()))?;
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|err| BlobStoreError::storage(err.to_string()))?;

        info!(file = %file_name, bytes = upload.bytes.len(), "attachment stored");
        Ok(format!("{}/{file_name}", self.public_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn upload(name: &str, bytes: Vec<u8>) -> FileUpload {
        FileUpload {
            original_name: name.to_owned(),
            bytes,
        }
    }

    #[actix_rt::test]
    async fn stores_an_accepted_upload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());

        let path = store
            .store(upload("receipt one.png", vec![1, 2, 3]))
            .await
            .expect("store succeeds");

        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with("-receipt_one.png"));
        let file_name = path.strip_prefix("/uploads/").expect("prefix");
        let written = std::fs::read(dir.path().join(file_name)).expect("written file");
        assert_eq!(written, vec![1, 2, 3]);
    }

    #[actix_rt::test]
    async fn rejects_oversized_uploads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());

        let err = store
            .store(upload("big.pdf", vec![0; MAX_UPLOAD_BYTES + 1]))
            .await
            .expect_err("too large");
        assert!(matches!(err, BlobStoreError::TooLarge { .. }));
    }

    #[rstest]
    #[case("script.exe")]
    #[case("archive.zip")]
    #[case("noextension")]
    #[actix_rt::test]
    async fn rejects_disallowed_types(#[case] name: &str) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());

        let err = store
            .store(upload(name, vec![1]))
            .await
            .expect_err("unsupported type");
        assert!(matches!(err, BlobStoreError::UnsupportedType { .. }));
    }

    #[actix_rt::test]
    async fn traversal_attempts_are_neutralised() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsBlobStore::new(dir.path());

        let path = store
            .store(upload("../../etc/passwd.txt", vec![1]))
            .await
            .expect("store succeeds");

        let file_name = path.strip_prefix("/uploads/").expect("prefix");
        assert!(!file_name.contains('/'));
        assert!(dir.path().join(file_name).exists());
    }
}
