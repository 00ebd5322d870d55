use anyhow::{bail, Result};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Filesystem store for uploaded post images, rooted at the configured
/// resource directory. Paths handed out and accepted are relative to the root.
#[derive(Debug, Clone)]
pub struct ResourceStore {
    root: PathBuf,
    max_upload_bytes: usize,
}

impl ResourceStore {
    pub fn new(root: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Checks size and sniffed content type of an upload before anything is
    /// written. Returns the detected mime type.
    pub fn validate_image(&self, data: &[u8]) -> Result<&'static str> {
        if data.len() > self.max_upload_bytes {
            bail!(
                "File too large: {} bytes (max {} bytes)",
                data.len(),
                self.max_upload_bytes
            );
        }

        let mime = infer::get(data)
            .map(|kind| kind.mime_type())
            .unwrap_or("application/octet-stream");

        if !ALLOWED_IMAGE_TYPES.contains(&mime) {
            bail!(
                "File type not allowed: {}. Allowed types: {}",
                mime,
                ALLOWED_IMAGE_TYPES.join(", ")
            );
        }

        Ok(mime)
    }

    /// Writes `data` to `{root}/{user_id}/{post_id}/{uuid}-{millis}{ext}` and
    /// returns the path relative to the root.
    pub fn save(&self, user_id: i64, post_id: i64, original_name: &str, data: &[u8]) -> Result<String> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();

        let filename = format!(
            "{}-{}{}",
            Uuid::new_v4(),
            chrono::Utc::now().timestamp_millis(),
            extension
        );

        let relative = format!("{}/{}/{}", user_id, post_id, filename);
        let dir = self.post_dir(user_id, post_id);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(&filename), data)?;

        tracing::debug!(path = %relative, bytes = data.len(), "Stored resource");
        Ok(relative)
    }

    /// Deletes a stored file. Missing files and unsafe paths are ignored.
    pub fn remove(&self, relative: &str) -> Result<()> {
        let Some(path) = self.resolve(relative) else {
            return Ok(());
        };
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %relative, "Removed resource");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the per-post directory once it holds no files.
    pub fn remove_post_dir(&self, user_id: i64, post_id: i64) -> Result<()> {
        remove_dir_if_empty(&self.post_dir(user_id, post_id))
    }

    /// Removes the directory a stored file lived in once it holds no files.
    /// Follows the path itself, so it also covers posts whose owner changed
    /// after the file was written.
    pub fn remove_empty_parent(&self, relative: &str) -> Result<()> {
        let Some(parent) = Path::new(relative).parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty()
            || parent
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Ok(());
        }
        remove_dir_if_empty(&self.root.join(parent))
    }

    /// Maps a relative resource path to an existing file under the root.
    /// Absolute paths, parent components and anything resolving outside the
    /// root yield `None`.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = relative.trim_start_matches("./");
        if relative.is_empty() {
            return None;
        }

        let candidate = Path::new(relative);
        if candidate
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }

        let canonical_root = self.root.canonicalize().ok()?;
        let canonical_file = self.root.join(candidate).canonicalize().ok()?;
        if !canonical_file.starts_with(&canonical_root) || !canonical_file.is_file() {
            return None;
        }

        Some(canonical_file)
    }

    fn post_dir(&self, user_id: i64, post_id: i64) -> PathBuf {
        self.root.join(user_id.to_string()).join(post_id.to_string())
    }
}

fn remove_dir_if_empty(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }
    if std::fs::read_dir(dir)?.next().is_none() {
        std::fs::remove_dir(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
        0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn test_save_layout_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResourceStore::new(dir.path(), 1024);

        let relative = store.save(7, 42, "Cover.PNG", PNG).unwrap();
        assert!(relative.starts_with("7/42/"));
        assert!(relative.ends_with(".png"));
        assert!(dir.path().join(&relative).is_file());

        store.remove(&relative).unwrap();
        assert!(!dir.path().join(&relative).exists());
        // second removal is a no-op
        store.remove(&relative).unwrap();

        store.remove_post_dir(7, 42).unwrap();
        assert!(!dir.path().join("7/42").exists());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"nope").unwrap();
        let store = ResourceStore::new(&root, 1024);

        assert!(store.resolve("../secret.txt").is_none());
        assert!(store.resolve("/etc/passwd").is_none());
        assert!(store.resolve("").is_none());
        assert!(store.resolve("missing.png").is_none());
    }

    #[test]
    fn test_validate_image() {
        let store = ResourceStore::new("unused", 1024);
        assert_eq!(store.validate_image(PNG).unwrap(), "image/png");
        assert!(store.validate_image(b"plain text, not an image").is_err());

        let tiny = ResourceStore::new("unused", 8);
        assert!(tiny.validate_image(PNG).is_err());
    }
}
