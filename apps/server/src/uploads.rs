//! # Image Store
//!
//! Book cover images on local disk.
//!
//! ```text
//! upload "Sampul Kitab (1).PNG"
//!      │  extension allow-list: png jpg jpeg gif webp
//!      │  sanitize_filename
//!      ▼
//! {upload_dir}/1714550400_3f9c2a1e_Sampul_Kitab_1.PNG
//!                 (unix secs)(random tag)
//! ```
//!
//! Stored names are flat: no directories, no leading dots, so a name that
//! round-trips through [`sanitize_filename`] unchanged is safe to join onto
//! the upload directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use kitab_core::validation::{file_extension, sanitize_filename, validate_extension, ALLOWED_IMAGE_EXTENSIONS};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// Cover image directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ImageStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stores an upload and returns its stored file name.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> ApiResult<String> {
        validate_extension("image", original_name, ALLOWED_IMAGE_EXTENSIONS)?;

        let clean = sanitize_filename(original_name);
        if clean.is_empty() || file_extension(&clean).is_none() {
            return Err(ApiError::validation(format!("Invalid image file name '{}'", original_name)));
        }

        // Same name in the same second still gets its own file
        let tag = Uuid::new_v4().simple().to_string();
        let filename = format!("{}_{}_{}", Utc::now().timestamp(), &tag[..8], clean);

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            tracing::error!(dir = %self.dir.display(), "Cannot create upload directory: {}", e);
            ApiError::internal("Failed to store image")
        })?;
        tokio::fs::write(self.dir.join(&filename), bytes).await.map_err(|e| {
            tracing::error!(%filename, "Cannot write image: {}", e);
            ApiError::internal("Failed to store image")
        })?;

        info!(%filename, bytes = bytes.len(), "Image stored");
        Ok(filename)
    }

    /// Deletes a stored image. A file that is already gone counts as deleted.
    pub async fn remove(&self, filename: &str) {
        let Some(path) = self.resolve(filename) else {
            warn!(%filename, "Refusing to delete suspicious image name");
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(%filename, "Image deleted"),
            Err(e) if e.kind() == ErrorKind::NotFound => debug!(%filename, "Image already absent"),
            Err(e) => warn!(%filename, "Failed to delete image: {}", e),
        }
    }

    /// Maps a requested name to a path inside the store, rejecting traversal.
    pub fn resolve(&self, requested: &str) -> Option<PathBuf> {
        if requested.is_empty() || requested.contains("..") || sanitize_filename(requested) != requested {
            return None;
        }
        Some(self.dir.join(requested))
    }

    /// Reads a stored image. `Ok(None)` when it does not exist.
    pub async fn read(&self, requested: &str) -> ApiResult<Option<Vec<u8>>> {
        let path = self
            .resolve(requested)
            .ok_or_else(|| ApiError::validation("Invalid file name"))?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => {
                tracing::error!(file = %path.display(), "Cannot read image: {}", e);
                Err(ApiError::internal("Failed to read image"))
            }
        }
    }
}

/// Content type for a stored image, by extension.
pub fn content_type_for(filename: &str) -> &'static str {
    match file_extension(filename).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> ImageStore {
        ImageStore::new(std::env::temp_dir().join(format!("kitab-images-{}", uuid::Uuid::new_v4())))
    }

    #[tokio::test]
    async fn test_save_read_remove() {
        let store = temp_store();
        let name = store.save("Sampul Kitab (1).PNG", b"png-bytes").await.unwrap();
        assert!(name.ends_with("_Sampul_Kitab_1.PNG"));

        let bytes = store.read(&name).await.unwrap();
        assert_eq!(bytes.as_deref(), Some(&b"png-bytes"[..]));

        store.remove(&name).await;
        assert_eq!(store.read(&name).await.unwrap(), None);

        // Second delete is a no-op
        store.remove(&name).await;
        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn test_same_name_uploads_do_not_collide() {
        let store = temp_store();
        let first = store.save("cover.png", b"first").await.unwrap();
        let second = store.save("cover.png", b"second").await.unwrap();
        assert_ne!(first, second);

        store.remove(&first).await;
        assert_eq!(store.read(&second).await.unwrap().as_deref(), Some(&b"second"[..]));
        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn test_rejects_disallowed_extension() {
        let store = temp_store();
        let err = store.save("script.exe", b"x").await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let store = ImageStore::new("/srv/uploads");
        assert!(store.resolve("../etc/passwd").is_none());
        assert!(store.resolve("a/b.png").is_none());
        assert!(store.resolve(".hidden.png").is_none());
        assert!(store.resolve("..").is_none());
        assert_eq!(
            store.resolve("1714550400_cover.png"),
            Some(PathBuf::from("/srv/uploads/1714550400_cover.png"))
        );
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for("a.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
    }
}
