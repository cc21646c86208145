use axum::{
    extract::{Query, State},
    Extension, Json,
};
use validator::Validate;

use super::journal::date_range;
use super::{current_profile, record_reads};
use crate::auth::middleware::AuthUser;
use crate::dto::{CreateMoodEntryRequest, DateRangeQuery};
use crate::error::AppResult;
use crate::models::access_log::EntryType;
use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::AppState;

pub async fn create_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateMoodEntryRequest>,
) -> AppResult<Json<MoodEntry>> {
    body.validate()?;
    let profile = current_profile(&state, auth_user.id).await?;

    let entry = state
        .store
        .upsert_mood_entry(NewMoodEntry {
            user_id: profile.id,
            date: body.date,
            mood: body.mood.trim().to_string(),
            shared_with: profile.partner_id.into_iter().collect(),
        })
        .await?;

    Ok(Json(entry))
}

pub async fn list_moods(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let range = date_range(&query)?;
    let profile = current_profile(&state, auth_user.id).await?;

    let moods = state
        .store
        .list_visible_mood_entries(profile.id, range)
        .await?;

    record_reads(
        &state,
        &profile,
        EntryType::Mood,
        moods.iter().map(|m| (m.id, m.user_id)),
    )
    .await;

    Ok(Json(moods))
}
