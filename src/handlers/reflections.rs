use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use super::current_profile;
use crate::auth::middleware::AuthUser;
use crate::dto::{BackfillReflectionRequest, GenerateReflectionQuery, ReflectionResponse};
use crate::error::{AppError, AppResult};
use crate::models::journal::JournalEntry;
use crate::models::reflection::CoupleKey;
use crate::services::reflection_job::reflect_couple;
use crate::AppState;

/// Picks both partners' entries for `date` out of `entries` and returns the
/// couple key with the texts ordered to match it.
fn couple_texts(
    entries: &[JournalEntry],
    date: NaiveDate,
    user: Uuid,
    partner: Uuid,
) -> AppResult<(CoupleKey, String, String)> {
    let text_of = |owner: Uuid| {
        entries
            .iter()
            .find(|e| e.user_id == owner && e.date == date)
            .map(|e| e.content.clone())
    };

    let (Some(user_text), Some(partner_text)) = (text_of(user), text_of(partner)) else {
        return Err(AppError::BadRequest(
            "Both partners need a journal entry for this date".into(),
        ));
    };

    let key = CoupleKey::new(user, partner);
    if key.first() == user {
        Ok((key, user_text, partner_text))
    } else {
        Ok((key, partner_text, user_text))
    }
}

async fn reflect(
    state: &AppState,
    date: NaiveDate,
    entries: &[JournalEntry],
    user: Uuid,
    partner: Uuid,
) -> AppResult<ReflectionResponse> {
    let (key, text_a, text_b) = couple_texts(entries, date, user, partner)?;
    let outcome = reflect_couple(
        state.store.as_ref(),
        &state.reflections,
        date,
        key,
        &text_a,
        &text_b,
    )
    .await?;

    if outcome.created {
        tracing::info!(
            %date,
            user_a = %key.first(),
            user_b = %key.second(),
            "Shared reflection created"
        );
    }

    Ok(ReflectionResponse {
        reflection: outcome.reflection.reflection,
        date,
        created: outcome.created,
    })
}

/// Reflection for the caller and their partner on one day, generated on
/// first request.
pub async fn generate_reflection(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<GenerateReflectionQuery>,
) -> AppResult<Json<ReflectionResponse>> {
    let date = query.reflection_date;
    let profile = current_profile(&state, auth_user.id).await?;
    let partner = profile
        .partner_id
        .ok_or_else(|| AppError::BadRequest("No partner connected".into()))?;

    let entries = state
        .store
        .list_visible_journal_entries(profile.id, crate::db::DateRange::between(date, date))
        .await?;

    Ok(Json(reflect(&state, date, &entries, profile.id, partner).await?))
}

/// Fills in a missing reflection for a past day.
pub async fn backfill_reflection(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<BackfillReflectionRequest>,
) -> AppResult<Json<ReflectionResponse>> {
    if body.user_id == body.partner_id {
        return Err(AppError::BadRequest("A reflection needs two different users".into()));
    }
    if auth_user.id != body.user_id && auth_user.id != body.partner_id {
        return Err(AppError::Forbidden);
    }

    let user = state
        .store
        .get_profile(body.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if user.partner_id != Some(body.partner_id) {
        return Err(AppError::BadRequest("Users are not partners".into()));
    }

    let entries = state.store.journal_entries_on(body.date).await?;
    Ok(Json(
        reflect(&state, body.date, &entries, body.user_id, body.partner_id).await?,
    ))
}
