use crate::api::error::AppError;
use crate::models::ImageRecord;
use crate::utils::validation::Validator;
use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
    pub has_thumbnail: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Body limit hits surface as the size policy message.
fn multipart_error(err: MultipartError, validator: &Validator) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return validator.file_size_error().into();
    }
    AppError::BadRequest(err.body_text())
}

#[utoipa::path(
    post,
    path = "/upload/",
    request_body(content = Multipart, description = "Image upload in the `file` field"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Bad extension, oversize or malformed upload")
    ),
    tag = "images"
)]
pub async fn upload_image(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let validator = state.gallery.validator();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, validator))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();

        // Reject before reading the body
        validator.validate_extension(&filename)?;

        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| multipart_error(e, validator))?
        {
            data.extend_from_slice(&chunk);
            // Stop as soon as the limit is crossed; nothing is written
            validator.validate_file_size(data.len())?;
        }

        let record = state.gallery.upload(&filename, &data).await?;
        return Ok(Json(UploadResponse {
            url: record.url,
            has_thumbnail: record.has_thumbnail,
        }));
    }

    Err(AppError::BadRequest("No file provided".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/images",
    responses(
        (status = 200, description = "Stored images", body = Vec<ImageRecord>)
    ),
    tag = "images"
)]
pub async fn list_images(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<ImageRecord>>, AppError> {
    Ok(Json(state.gallery.list().await?))
}

#[utoipa::path(
    delete,
    path = "/api/images/{image_id}",
    params(
        ("image_id" = String, Path, description = "Image identifier (file name without extension)")
    ),
    responses(
        (status = 200, description = "Image deleted", body = MessageResponse),
        (status = 404, description = "Image not found")
    ),
    tag = "images"
)]
pub async fn delete_image(
    State(state): State<crate::AppState>,
    Path(image_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.gallery.delete(&image_id).await?;
    Ok(Json(MessageResponse {
        message: "Image deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/images/{image_id}/thumbnail",
    params(
        ("image_id" = String, Path, description = "Image identifier (file name without extension)")
    ),
    responses(
        (status = 200, description = "Thumbnail regenerated", body = ImageRecord),
        (status = 404, description = "Image not found"),
        (status = 422, description = "Thumbnail could not be generated")
    ),
    tag = "images"
)]
pub async fn regenerate_thumbnail(
    State(state): State<crate::AppState>,
    Path(image_id): Path<String>,
) -> Result<Json<ImageRecord>, AppError> {
    Ok(Json(state.gallery.regenerate_thumbnail(&image_id).await?))
}
