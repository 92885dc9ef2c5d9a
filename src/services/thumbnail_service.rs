use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::config::GalleryConfig;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Unsupported thumbnail format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to load image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("Failed to encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Thumbnail I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Thumbnail task failed: {0}")]
    Task(String),
}

/// Derives bounded-size copies of stored originals.
#[derive(Debug, Clone)]
pub struct ThumbnailService {
    width: u32,
    height: u32,
}

impl ThumbnailService {
    pub fn new(config: &GalleryConfig) -> Self {
        Self {
            width: config.thumbnail_width,
            height: config.thumbnail_height,
        }
    }

    /// Decode `source`, fit it inside the bounding box keeping aspect ratio,
    /// and write it to `dest` in the format implied by the destination extension.
    pub fn create_thumbnail(&self, source: &Path, dest: &Path) -> Result<(), ThumbnailError> {
        let format = ImageFormat::from_path(dest)
            .map_err(|_| ThumbnailError::UnsupportedFormat(dest.display().to_string()))?;

        // Sniff the content; the stored extension is only a fallback
        let img = image::io::Reader::open(source)?
            .with_guessed_format()?
            .decode()
            .map_err(ThumbnailError::Decode)?;

        // Images already inside the box are kept at their size
        let thumbnail = if img.width() <= self.width && img.height() <= self.height {
            img
        } else {
            img.thumbnail(self.width, self.height)
        };

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::encoder_compatible(thumbnail, format)
            .save_with_format(dest, format)
            .map_err(ThumbnailError::Encode)?;

        info!("Thumbnail written to {} ({:?})", dest.display(), format);
        Ok(())
    }

    /// Runs `create_thumbnail` on the blocking pool.
    pub async fn generate(&self, source: PathBuf, dest: PathBuf) -> Result<(), ThumbnailError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.create_thumbnail(&source, &dest))
            .await
            .map_err(|e| ThumbnailError::Task(e.to_string()))?
    }

    // JPEG has no alpha channel and GIF frames are RGBA; 16-bit and float
    // color types are reduced to 8-bit.
    fn encoder_compatible(img: DynamicImage, format: ImageFormat) -> DynamicImage {
        match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
            ImageFormat::Gif => DynamicImage::ImageRgba8(img.to_rgba8()),
            _ => match img.color() {
                image::ColorType::Rgba16 | image::ColorType::La16 | image::ColorType::Rgba32F => {
                    DynamicImage::ImageRgba8(img.to_rgba8())
                }
                image::ColorType::Rgb16 | image::ColorType::L16 | image::ColorType::Rgb32F => {
                    DynamicImage::ImageRgb8(img.to_rgb8())
                }
                _ => img,
            },
        }
    }
}
