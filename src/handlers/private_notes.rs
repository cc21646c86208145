use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{CreatePrivateNoteRequest, PrivateNoteQuery};
use crate::error::AppResult;
use crate::models::private_note::{NewPrivateNote, PrivateNote};
use crate::AppState;

/// Notes are visible only to their author.
pub async fn save_note(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreatePrivateNoteRequest>,
) -> AppResult<Json<PrivateNote>> {
    body.validate()?;

    let note = state
        .store
        .upsert_private_note(NewPrivateNote {
            user_id: auth_user.id,
            entry_id: body.entry_id,
            entry_type: body.entry_type,
            note_content: body.note_content.trim().to_string(),
        })
        .await?;

    Ok(Json(note))
}

pub async fn get_note(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Query(query): Query<PrivateNoteQuery>,
) -> AppResult<Json<Option<PrivateNote>>> {
    let note = state
        .store
        .get_private_note(auth_user.id, entry_id, query.entry_type)
        .await?;
    Ok(Json(note))
}
