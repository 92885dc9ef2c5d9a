pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::GalleryConfig;
use crate::services::gallery_service::GalleryService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Multipart framing allowance on top of the file size limit
const MULTIPART_OVERHEAD: usize = 10 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::images::upload_image,
        api::handlers::images::list_images,
        api::handlers::images::delete_image,
        api::handlers::images::regenerate_thumbnail,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::images::UploadResponse,
            api::handlers::images::MessageResponse,
            api::handlers::health::HealthResponse,
            models::ImageRecord,
        )
    ),
    tags(
        (name = "images", description = "Image upload and management endpoints"),
        (name = "system", description = "Service status")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: GalleryConfig,
    pub gallery: Arc<GalleryService>,
}

impl AppState {
    pub fn new(config: GalleryConfig, storage: Arc<dyn StorageService>) -> Self {
        let gallery = Arc::new(GalleryService::new(&config, storage));
        Self { config, gallery }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;

    // Runs inside the request-id layer, so the header is always present here
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/upload", post(api::handlers::images::upload_image))
        .route("/upload/", post(api::handlers::images::upload_image))
        .route("/api/images", get(api::handlers::images::list_images))
        .route(
            "/api/images/:image_id",
            delete(api::handlers::images::delete_image),
        )
        .route(
            "/api/images/:image_id/thumbnail",
            post(api::handlers::images::regenerate_thumbnail),
        )
        .nest_service("/images", ServeDir::new(&state.config.images_dir))
        .nest_service("/thumbnails", ServeDir::new(&state.config.thumbnails_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(trace_layer)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
