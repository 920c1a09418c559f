use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    auth::extractors::AdminUser,
    error::AppError,
    images::services::{check_key, store_upload, UploadItem},
    state::AppState,
};

// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

pub fn upload_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD))
}

/// Served both at the root and under `/api`.
pub fn serve_routes() -> Router<AppState> {
    Router::new().route("/uploads/:file_name", get(serve_upload))
}

/// POST /upload (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    while let Some(field) = mp.next_field().await.map_err(|e| {
        warn!(error = %e, "malformed multipart body");
        AppError::validation(e.body_text())
    })? {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = field.file_name().map(str::to_string);
        let body = field.bytes().await.map_err(|e| {
            warn!(error = %e, "failed reading upload");
            AppError::validation(e.body_text())
        })?;

        let image_url = store_upload(
            state.storage.as_ref(),
            UploadItem {
                body,
                content_type: &content_type,
                file_name: file_name.as_deref(),
            },
            state.config.upload_max_bytes,
        )
        .await?;

        info!(user_id = admin.user_id, image_url = %image_url, "upload stored");
        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                message: "Image uploaded successfully".into(),
                image_url,
            }),
        ));
    }
    Err(AppError::validation("No image provided"))
}

#[instrument(skip(state))]
pub async fn serve_upload(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check_key(&file_name)?;
    let Some(obj) = state.storage.get_object(&file_name).await? else {
        return Err(AppError::not_found("Image not found"));
    };
    Ok(([(header::CONTENT_TYPE, obj.content_type)], obj.body))
}
