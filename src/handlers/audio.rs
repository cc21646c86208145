use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::AudioUploadResponse;
use crate::error::{AppError, AppResult};
use crate::services::object_store::audio_extension;
use crate::AppState;

const FILE_FIELD: &str = "file";

/// Stores a voice note under `{user_id}/{uuid}.{ext}` and returns its public URL.
pub async fn upload_audio(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> AppResult<Json<AudioUploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_default();
        if !content_type.starts_with("audio/") {
            return Err(AppError::BadRequest("File must be an audio file".into()));
        }

        let extension = audio_extension(field.file_name());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::BadRequest("Audio file is empty".into()));
        }
        if bytes.len() > state.config.max_audio_bytes {
            return Err(AppError::BadRequest(format!(
                "Audio file exceeds {} bytes",
                state.config.max_audio_bytes
            )));
        }

        let filename = format!("{}/{}.{}", auth_user.id, Uuid::new_v4(), extension);
        state
            .objects
            .upload(&filename, bytes.to_vec(), &content_type)
            .await?;

        tracing::info!(
            user_id = %auth_user.id,
            size = bytes.len(),
            path = %filename,
            "Audio uploaded"
        );

        return Ok(Json(AudioUploadResponse {
            audio_url: state.objects.public_url(&filename),
            filename,
        }));
    }

    Err(AppError::BadRequest("Missing `file` field".into()))
}
