//! Filesystem asset store for uploaded media.
//!
//! Files land under a single directory with UUID names; the public URL is
//! `{base_url}/{uuid}.{ext}`. Serving the directory is the job of whatever
//! sits in front of the backend.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use uuid::Uuid;

use crate::{AssetStore, StoreError};

/// Accepted upload media types and their file extensions.
const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
];

/// Local-directory asset store.
pub struct FsAssetStore {
    root: PathBuf,
    base_url: String,
}

impl FsAssetStore {
    /// Store rooted at `root`, serving URLs under `base_url`.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            root: root.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn extension_for(content_type: &str) -> Option<&'static str> {
        ALLOWED_TYPES
            .iter()
            .find(|(mime, _)| *mime == content_type)
            .map(|(_, ext)| *ext)
    }
}

impl AssetStore for FsAssetStore {
    fn store(&self, bytes: &[u8], content_type: &str) -> Result<String, StoreError> {
        let ext = Self::extension_for(content_type)
            .ok_or_else(|| StoreError::UnsupportedMediaType(content_type.to_string()))?;

        fs::create_dir_all(&self.root)?;
        let file_name = format!("{}.{ext}", Uuid::new_v4());
        fs::write(self.root.join(&file_name), bytes)?;

        log::debug!("stored asset {file_name} ({} bytes)", bytes.len());
        Ok(format!("{}/{file_name}", self.base_url))
    }

    fn delete(&self, url: &str) -> Result<(), StoreError> {
        // Only the final path segment is ours; everything else is URL prefix
        let file_name = match url.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(()),
        };

        match fs::remove_file(self.root.join(file_name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
