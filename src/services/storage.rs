use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::GalleryConfig;
use crate::models::ImageRecord;

/// Extensions probed, in order, when resolving an identifier to a file.
pub const PROBE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif"];

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Create the originals and thumbnails directories if missing.
    async fn ensure_dirs(&self) -> Result<()>;
    /// Write an original, overwriting any file with the same name.
    async fn save(&self, name: &str, data: &[u8]) -> Result<PathBuf>;
    async fn list(&self) -> Result<Vec<ImageRecord>>;
    /// Resolve an identifier to the stored original's file name.
    async fn find(&self, id: &str) -> Result<Option<String>>;
    /// Remove an original and its thumbnail. Returns the removed name.
    async fn delete(&self, id: &str) -> Result<Option<String>>;
    async fn has_thumbnail(&self, name: &str) -> bool;
    fn original_path(&self, name: &str) -> PathBuf;
    fn thumbnail_path(&self, name: &str) -> PathBuf;
}

/// Flat two-directory layout on the local filesystem. The originals
/// directory listing is the index; nothing else is persisted.
pub struct LocalStorageService {
    images_dir: PathBuf,
    thumbnails_dir: PathBuf,
    probe_extensions: Vec<String>,
}

impl LocalStorageService {
    pub fn new(config: &GalleryConfig) -> Self {
        let mut probe_extensions: Vec<String> =
            PROBE_EXTENSIONS.iter().map(|e| e.to_string()).collect();
        for ext in &config.allowed_extensions {
            if !probe_extensions.contains(ext) {
                probe_extensions.push(ext.clone());
            }
        }

        Self {
            images_dir: config.images_dir.clone(),
            thumbnails_dir: config.thumbnails_dir.clone(),
            probe_extensions,
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }
}

/// Identifiers are bare file stems; anything that could leave the
/// directory is never resolved.
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.images_dir, &self.thumbnails_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    async fn save(&self, name: &str, data: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.images_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.images_dir.display()))?;

        let path = self.original_path(name);
        tokio::fs::write(&path, data)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    async fn list(&self) -> Result<Vec<ImageRecord>> {
        let mut entries = match tokio::fs::read_dir(&self.images_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read {}", self.images_dir.display())
                });
            }
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!("Skipping non UTF-8 file name {:?}", entry.file_name());
                continue;
            };
            let has_thumbnail = self.has_thumbnail(&name).await;
            records.push(ImageRecord::new(&name, has_thumbnail));
        }

        Ok(records)
    }

    async fn find(&self, id: &str) -> Result<Option<String>> {
        if !is_valid_id(id) {
            tracing::warn!("Rejected image identifier: {:?}", id);
            return Ok(None);
        }

        for ext in &self.probe_extensions {
            let name = format!("{}{}", id, ext);
            if is_regular_file(&self.original_path(&name)).await {
                return Ok(Some(name));
            }
        }
        Ok(None)
    }

    async fn delete(&self, id: &str) -> Result<Option<String>> {
        let Some(name) = self.find(id).await? else {
            return Ok(None);
        };

        let original = self.original_path(&name);
        match tokio::fs::remove_file(&original).await {
            Ok(()) => {}
            // Lost a race with another delete
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove {}", original.display()));
            }
        }

        let thumbnail = self.thumbnail_path(&name);
        match tokio::fs::remove_file(&thumbnail).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to remove {}", thumbnail.display()));
            }
        }

        Ok(Some(name))
    }

    async fn has_thumbnail(&self, name: &str) -> bool {
        is_regular_file(&self.thumbnail_path(name)).await
    }

    fn original_path(&self, name: &str) -> PathBuf {
        self.images_dir.join(name)
    }

    fn thumbnail_path(&self, name: &str) -> PathBuf {
        self.thumbnails_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> LocalStorageService {
        LocalStorageService::new(&GalleryConfig::with_root(dir.path()))
    }

    #[tokio::test]
    async fn test_save_list_delete_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.save("cat_01.jpg", b"bytes").await.unwrap();
        let records = store.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "cat_01.jpg");
        assert_eq!(records[0].id, "cat_01");
        assert!(!records[0].has_thumbnail);

        assert_eq!(
            store.delete("cat_01").await.unwrap().as_deref(),
            Some("cat_01.jpg")
        );
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        assert!(!store.images_dir().exists());

        let path = store.save("a.png", b"first").await.unwrap();
        store.save("a.png", b"second").await.unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_subdirectories_and_reports_thumbnails() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_dirs().await.unwrap();
        std::fs::create_dir(store.images_dir().join("nested")).unwrap();
        store.save("with_thumb.png", b"x").await.unwrap();
        store.save("without_thumb.gif", b"y").await.unwrap();
        std::fs::write(store.thumbnail_path("with_thumb.png"), b"t").unwrap();

        let mut records = store.list().await.unwrap();
        records.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "with_thumb.png");
        assert!(records[0].has_thumbnail);
        assert_eq!(records[1].name, "without_thumb.gif");
        assert!(!records[1].has_thumbnail);
    }

    #[tokio::test]
    async fn test_delete_removes_thumbnail() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_dirs().await.unwrap();
        store.save("dog.jpeg", b"x").await.unwrap();
        std::fs::write(store.thumbnail_path("dog.jpeg"), b"t").unwrap();

        assert!(store.delete("dog").await.unwrap().is_some());
        assert!(!store.original_path("dog.jpeg").exists());
        assert!(!store.thumbnail_path("dog.jpeg").exists());
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save("known.png", b"x").await.unwrap();

        assert!(store.delete("unknown").await.unwrap().is_none());
        // Extensions outside the probe set are never matched
        store.save("notes.txt", b"x").await.unwrap();
        assert!(store.delete("notes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_probe_order_prefers_jpg() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save("same.png", b"png").await.unwrap();
        store.save("same.jpg", b"jpg").await.unwrap();

        assert_eq!(store.find("same").await.unwrap().as_deref(), Some("same.jpg"));
        store.delete("same").await.unwrap();
        assert_eq!(store.find("same").await.unwrap().as_deref(), Some("same.png"));
    }

    #[tokio::test]
    async fn test_traversal_ids_are_not_resolved() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.ensure_dirs().await.unwrap();
        std::fs::write(dir.path().join("outside.png"), b"x").unwrap();

        assert!(store.find("../outside").await.unwrap().is_none());
        assert!(store.find("..\\outside").await.unwrap().is_none());
        assert!(store.find("").await.unwrap().is_none());
        assert!(dir.path().join("outside.png").exists());
    }

    #[tokio::test]
    async fn test_configured_extensions_are_probed() {
        let dir = TempDir::new().unwrap();
        let config = GalleryConfig {
            allowed_extensions: vec![".webp".to_string()],
            ..GalleryConfig::with_root(dir.path())
        };
        let store = LocalStorageService::new(&config);
        store.save("pic.webp", b"x").await.unwrap();

        assert_eq!(store.find("pic").await.unwrap().as_deref(), Some("pic.webp"));
    }
}
