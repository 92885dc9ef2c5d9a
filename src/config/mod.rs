use std::env;
use std::path::PathBuf;

/// Gallery policy and storage layout
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    /// Directory holding uploaded originals (default: "images")
    pub images_dir: PathBuf,

    /// Directory holding derived thumbnails (default: "thumbnails")
    pub thumbnails_dir: PathBuf,

    /// Maximum upload size in bytes (default: 5 MB)
    pub max_file_size: usize,

    /// Allowed extensions, lowercase with leading dot (default: .png, .jpg, .jpeg, .gif)
    pub allowed_extensions: Vec<String>,

    /// Thumbnail bounding box width (default: 100)
    pub thumbnail_width: u32,

    /// Thumbnail bounding box height (default: 100)
    pub thumbnail_height: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("images"),
            thumbnails_dir: PathBuf::from("thumbnails"),
            max_file_size: 5 * 1024 * 1024, // 5 MB
            allowed_extensions: vec![
                ".png".to_string(),
                ".jpg".to_string(),
                ".jpeg".to_string(),
                ".gif".to_string(),
            ],
            thumbnail_width: 100,
            thumbnail_height: 100,
        }
    }
}

impl GalleryConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        let thumbnail_size: Option<u32> = env::var("THUMBNAIL_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|size| *size > 0);

        Self {
            images_dir: env::var("IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.images_dir),

            thumbnails_dir: env::var("THUMBNAILS_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.thumbnails_dir),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .ok()
                .map(|v| parse_extensions(&v))
                .filter(|exts| !exts.is_empty())
                .unwrap_or(default.allowed_extensions),

            thumbnail_width: thumbnail_size.unwrap_or(default.thumbnail_width),
            thumbnail_height: thumbnail_size.unwrap_or(default.thumbnail_height),
        }
    }

    /// Same policy with both storage directories rooted under `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            images_dir: root.join("images"),
            thumbnails_dir: root.join("thumbnails"),
            ..Self::default()
        }
    }

    pub fn max_file_size_mb(&self) -> usize {
        self.max_file_size / 1024 / 1024
    }
}

/// Normalizes a comma separated list ("PNG, .jpg,gif") to [".png", ".jpg", ".gif"]
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
        .collect()
}
