use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::AppError;
use crate::config::GalleryConfig;
use crate::models::ImageRecord;
use crate::services::storage::StorageService;
use crate::services::thumbnail_service::ThumbnailService;
use crate::utils::naming::get_unique_filename;
use crate::utils::validation::{Validator, sanitize_filename};

/// Upload pipeline: validate, name, store, thumbnail.
pub struct GalleryService {
    storage: Arc<dyn StorageService>,
    validator: Validator,
    thumbnails: ThumbnailService,
}

impl GalleryService {
    pub fn new(config: &GalleryConfig, storage: Arc<dyn StorageService>) -> Self {
        Self {
            storage,
            validator: Validator::new(config),
            thumbnails: ThumbnailService::new(config),
        }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Stores a validated upload under a generated name. A failed thumbnail
    /// does not fail the upload; the returned record reports it.
    pub async fn upload(&self, filename: &str, data: &[u8]) -> Result<ImageRecord, AppError> {
        let filename = sanitize_filename(filename)?;
        self.validator.validate_upload(&filename, data.len())?;

        let name = get_unique_filename(&filename);
        let original = self.storage.save(&name, data).await?;
        info!("Stored {} ({} bytes) as {}", filename, data.len(), name);

        let has_thumbnail = match self
            .thumbnails
            .generate(original, self.storage.thumbnail_path(&name))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Thumbnail generation failed for {}: {}", name, e);
                false
            }
        };

        Ok(ImageRecord::new(&name, has_thumbnail))
    }

    pub async fn list(&self) -> Result<Vec<ImageRecord>, AppError> {
        Ok(self.storage.list().await?)
    }

    pub async fn delete(&self, id: &str) -> Result<String, AppError> {
        let name = self
            .storage
            .delete(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
        info!("Deleted image {}", name);
        Ok(name)
    }

    /// Rebuilds the thumbnail of an existing original. Unlike uploads,
    /// failures here are returned to the caller.
    pub async fn regenerate_thumbnail(&self, id: &str) -> Result<ImageRecord, AppError> {
        let name = self
            .storage
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;

        self.thumbnails
            .generate(
                self.storage.original_path(&name),
                self.storage.thumbnail_path(&name),
            )
            .await?;

        info!("Regenerated thumbnail for {}", name);
        Ok(ImageRecord::new(&name, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::LocalStorageService;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> GalleryService {
        let config = GalleryConfig::with_root(dir.path());
        GalleryService::new(&config, Arc::new(LocalStorageService::new(&config)))
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        RgbImage::from_pixel(width, height, Rgb([10, 120, 10]))
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_upload_writes_original_and_thumbnail() {
        let dir = TempDir::new().unwrap();
        let gallery = service(&dir);

        let record = gallery.upload("cat.png", &png_bytes(300, 300)).await.unwrap();

        assert!(record.name.starts_with("cat_"));
        assert!(record.name.ends_with(".png"));
        assert!(record.has_thumbnail);
        assert!(dir.path().join("images").join(&record.name).exists());
        assert!(dir.path().join("thumbnails").join(&record.name).exists());
    }

    #[tokio::test]
    async fn test_upload_survives_thumbnail_failure() {
        let dir = TempDir::new().unwrap();
        let gallery = service(&dir);

        let record = gallery.upload("broken.gif", b"GIF89a garbage").await.unwrap();

        assert!(!record.has_thumbnail);
        assert!(dir.path().join("images").join(&record.name).exists());
        assert!(!dir.path().join("thumbnails").join(&record.name).exists());
    }

    #[tokio::test]
    async fn test_upload_rejections_write_nothing() {
        let dir = TempDir::new().unwrap();
        let gallery = service(&dir);

        let err = gallery.upload("run.exe", b"MZ").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let big = vec![0u8; 5 * 1024 * 1024 + 1];
        let err = gallery.upload("big.png", &big).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.starts_with("Размер файла превышает")));

        assert!(gallery.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_strips_client_directories() {
        let dir = TempDir::new().unwrap();
        let gallery = service(&dir);

        let record = gallery
            .upload("../../escape.png", &png_bytes(10, 10))
            .await
            .unwrap();

        assert!(record.name.starts_with("escape_"));
        assert!(dir.path().join("images").join(&record.name).exists());
    }

    #[tokio::test]
    async fn test_delete_and_not_found() {
        let dir = TempDir::new().unwrap();
        let gallery = service(&dir);
        let record = gallery.upload("cat.png", &png_bytes(20, 20)).await.unwrap();

        assert_eq!(gallery.delete(&record.id).await.unwrap(), record.name);
        let err = gallery.delete(&record.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Image not found"));
    }

    #[tokio::test]
    async fn test_regenerate_missing_thumbnail() {
        let dir = TempDir::new().unwrap();
        let gallery = service(&dir);
        let record = gallery.upload("cat.png", &png_bytes(200, 100)).await.unwrap();
        let thumb = dir.path().join("thumbnails").join(&record.name);
        std::fs::remove_file(&thumb).unwrap();

        let listed = gallery.list().await.unwrap();
        assert!(!listed[0].has_thumbnail);

        let regenerated = gallery.regenerate_thumbnail(&record.id).await.unwrap();
        assert!(regenerated.has_thumbnail);
        assert!(thumb.exists());
    }

    #[tokio::test]
    async fn test_regenerate_reports_failures() {
        let dir = TempDir::new().unwrap();
        let gallery = service(&dir);
        let record = gallery.upload("bad.jpg", b"not a jpeg").await.unwrap();

        let err = gallery.regenerate_thumbnail(&record.id).await.unwrap_err();
        assert!(matches!(err, AppError::Thumbnail(_)));

        let err = gallery.regenerate_thumbnail("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
