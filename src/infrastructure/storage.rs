use crate::config::GalleryConfig;
use crate::services::storage::{LocalStorageService, StorageService};
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &GalleryConfig) -> anyhow::Result<Arc<LocalStorageService>> {
    info!(
        "🗂️  Local Storage: originals={} thumbnails={}",
        config.images_dir.display(),
        config.thumbnails_dir.display()
    );

    let storage = LocalStorageService::new(config);
    storage.ensure_dirs().await?;

    info!("✅ Storage directories are ready");
    Ok(Arc::new(storage))
}
