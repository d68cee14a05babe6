//! Object storage for uploaded documents

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
    models::{paper::DocumentSlot, user::ProfileDocument},
};

/// Blob store keyed by slash-separated paths
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` and return the key actually used
    async fn put(&self, key: &str, bytes: &[u8]) -> AppResult<String>;
}

/// Reduce an uploaded file name to its final path component
pub fn sanitize_filename(filename: &str) -> AppResult<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return Err(AppError::Validation(format!("Invalid file name '{}'", filename)));
    }
    Ok(name.to_string())
}

/// `{prefix}/{user_id}_{username}/paper_{uuid}/{slot}/{filename}`
pub fn paper_document_key(
    prefix: &str,
    user_id: i32,
    username: &str,
    paper_uuid: Uuid,
    slot: DocumentSlot,
    filename: &str,
) -> AppResult<String> {
    Ok(format!(
        "{}/{}_{}/paper_{}/{}/{}",
        prefix,
        user_id,
        username,
        paper_uuid,
        slot.as_str(),
        sanitize_filename(filename)?
    ))
}

/// `{prefix}/{user_id}_{username}/{cv|bio}/{filename}`
pub fn profile_document_key(
    prefix: &str,
    user_id: i32,
    username: &str,
    document: ProfileDocument,
    filename: &str,
) -> AppResult<String> {
    Ok(format!(
        "{}/{}_{}/{}/{}",
        prefix,
        user_id,
        username,
        document.as_str(),
        sanitize_filename(filename)?
    ))
}

/// Filesystem store rooted at a directory
#[derive(Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.root.clone(),
        }
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::Validation(format!("Invalid storage key '{}'", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> AppResult<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create {}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write {}: {}", path.display(), e)))?;

        tracing::debug!("Stored {} bytes under {}", bytes.len(), key);
        Ok(key.to_string())
    }
}
