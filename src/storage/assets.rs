//! Filesystem asset store for cover images
//!
//! Covers are content-addressed: the key is the hex SHA-256 of the image bytes
//! plus an extension taken from the content type, so re-uploading the same
//! image is a no-op.

use crate::storage::traits::{AssetStore, StorageResult};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores assets as files under one directory
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    /// Creates the store, creating `root` if it does not exist
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetStore for FsAssetStore {
    fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> StorageResult<String> {
        let path = self.root.join(key);
        if !path.exists() {
            fs::write(&path, bytes)?;
            tracing::debug!("Stored {} asset {} ({} bytes)", content_type, key, bytes.len());
        }
        Ok(key.to_string())
    }
}

/// Content-addressed key for a cover image
pub fn cover_key(bytes: &[u8], content_type: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{}.{}", hex::encode(hasher.finalize()), extension_for(content_type))
}

fn extension_for(content_type: &str) -> &'static str {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}
