use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use super::{current_profile, record_reads};
use crate::auth::middleware::AuthUser;
use crate::db::DateRange;
use crate::dto::{
    CreateJournalEntryRequest, DateRangeQuery, MessageResponse, UpdateJournalEntryRequest,
};
use crate::error::{AppError, AppResult};
use crate::models::access_log::EntryType;
use crate::models::journal::{JournalEntry, JournalEntryPatch, NewJournalEntry};
use crate::AppState;

pub(crate) fn date_range(query: &DateRangeQuery) -> AppResult<DateRange> {
    if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
        if from > to {
            return Err(AppError::BadRequest("date_from must not be after date_to".into()));
        }
    }
    Ok(DateRange::new(query.date_from, query.date_to))
}

/// Writes the caller's entry for a day, replacing any earlier one.
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateJournalEntryRequest>,
) -> AppResult<Json<JournalEntry>> {
    body.validate()?;
    let profile = current_profile(&state, auth_user.id).await?;

    let entry = state
        .store
        .upsert_journal_entry(NewJournalEntry {
            user_id: profile.id,
            date: body.date,
            content: body.content.trim().to_string(),
            mood: body.mood,
            audio_url: body.audio_url,
            shared_with: profile.partner_id.into_iter().collect(),
        })
        .await?;

    tracing::debug!(user_id = %profile.id, date = %entry.date, "Journal entry saved");
    Ok(Json(entry))
}

/// Own entries plus entries shared with the caller, newest first.
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<JournalEntry>>> {
    let range = date_range(&query)?;
    let profile = current_profile(&state, auth_user.id).await?;

    let entries = state
        .store
        .list_visible_journal_entries(profile.id, range)
        .await?;

    record_reads(
        &state,
        &profile,
        EntryType::Journal,
        entries.iter().map(|e| (e.id, e.user_id)),
    )
    .await;

    Ok(Json(entries))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<UpdateJournalEntryRequest>,
) -> AppResult<Json<JournalEntry>> {
    body.validate()?;
    let mut patch = JournalEntryPatch::from(body);
    if patch.is_empty() {
        return Err(AppError::BadRequest("No fields to update".into()));
    }
    patch.content = patch.content.map(|c| c.trim().to_string());

    let entry = state
        .store
        .update_journal_entry(auth_user.id, entry_id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Journal entry not found".into()))?;

    Ok(Json(entry))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let deleted = state
        .store
        .delete_journal_entry(auth_user.id, entry_id)
        .await?;

    if !deleted {
        return Err(AppError::NotFound("Journal entry not found".into()));
    }

    Ok(Json(MessageResponse {
        message: "Journal entry deleted".into(),
    }))
}
