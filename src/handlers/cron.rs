use axum::{extract::State, Json};
use chrono::{Duration, Utc};

use crate::dto::SweepResponse;
use crate::error::AppResult;
use crate::services::reflection_job::run_reflection_sweep;
use crate::AppState;

/// Scheduler hook: reflections for every couple that journaled yesterday.
pub async fn generate_reflections(State(state): State<AppState>) -> AppResult<Json<SweepResponse>> {
    let yesterday = Utc::now().date_naive() - Duration::days(1);
    let report = run_reflection_sweep(state.store.as_ref(), &state.reflections, yesterday).await?;

    tracing::info!(
        date = %yesterday,
        eligible = report.eligible_pairs,
        created = report.created,
        failed = report.failed,
        "Cron reflection sweep finished"
    );

    Ok(Json(SweepResponse {
        message: format!("Generated {} reflections", report.created),
        report,
    }))
}
