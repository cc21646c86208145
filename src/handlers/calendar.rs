use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{Duration, NaiveDate};

use super::current_profile;
use crate::auth::middleware::AuthUser;
use crate::db::DateRange;
use crate::dto::CalendarDay;
use crate::error::{AppError, AppResult};
use crate::AppState;

/// First and last day of a month, `None` for an invalid month.
fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year.checked_add(1)?, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next_first - Duration::days(1)))
}

/// One day per date of the month with both partners' entries and moods.
pub async fn get_month(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path((year, month)): Path<(i32, u32)>,
) -> AppResult<Json<Vec<CalendarDay>>> {
    let (first, last) = month_bounds(year, month)
        .ok_or_else(|| AppError::BadRequest("Invalid year or month".into()))?;
    let range = DateRange::between(first, last);

    let profile = current_profile(&state, auth_user.id).await?;
    let me = profile.id;
    let partner = profile.partner_id;

    let entries = state.store.list_visible_journal_entries(me, range).await?;
    let moods = state.store.list_visible_mood_entries(me, range).await?;
    let reflections = state.store.list_reflections_for(me, range).await?;

    let days = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(|date| {
            let entry_of = |owner| {
                entries
                    .iter()
                    .find(|e| e.date == date && e.user_id == owner)
                    .cloned()
            };
            let mood_of = |owner| {
                moods
                    .iter()
                    .find(|m| m.date == date && m.user_id == owner)
                    .cloned()
            };

            CalendarDay {
                date,
                user_entry: entry_of(me),
                partner_entry: partner.and_then(entry_of),
                shared_reflection: reflections
                    .iter()
                    .find(|r| {
                        r.date == date && partner.map_or(true, |p| r.couple_key().contains(p))
                    })
                    .cloned(),
                user_mood: mood_of(me),
                partner_mood: partner.and_then(mood_of),
            }
        })
        .collect();

    Ok(Json(days))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_bounds() {
        let (first, last) = month_bounds(2024, 2).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let (_, dec_last) = month_bounds(2023, 12).unwrap();
        assert_eq!(dec_last, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());

        assert!(month_bounds(2024, 13).is_none());
        assert!(month_bounds(2024, 0).is_none());
    }
}
