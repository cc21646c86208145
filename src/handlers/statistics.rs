use axum::{extract::State, Extension, Json};
use chrono::Utc;

use super::current_profile;
use crate::auth::middleware::AuthUser;
use crate::dto::Statistics;
use crate::error::AppResult;
use crate::services::streaks::compute_streaks;
use crate::AppState;

pub async fn get_statistics(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Statistics>> {
    let profile = current_profile(&state, auth_user.id).await?;

    let total_entries = state.store.count_journal_entries(profile.id).await?;

    let (partner_entries, total_reflections) = match profile.partner_id {
        Some(partner) => (
            state.store.count_journal_entries(partner).await?,
            state.store.count_reflections_for(profile.id).await?,
        ),
        None => (0, 0),
    };

    let dates = state.store.journal_dates(profile.id).await?;
    let streaks = compute_streaks(dates, Utc::now().date_naive());

    Ok(Json(Statistics {
        total_entries,
        partner_entries,
        // one reflection per shared day
        shared_days: total_reflections,
        total_reflections,
        current_streak: streaks.current_streak,
        longest_streak: streaks.longest_streak,
    }))
}
