use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::error::AppError;
use crate::AppState;

pub const CRON_SECRET_HEADER: &str = "cron-secret";

/// Guards scheduler-only endpoints with the shared `CRON_SECRET`.
/// With no secret configured every request is refused.
pub async fn require_cron_secret(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = state
        .config
        .cron_secret
        .as_deref()
        .ok_or(AppError::Unauthorized)?;

    let provided = req
        .headers()
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    if expected.as_bytes().ct_eq(provided.as_bytes()).into() {
        Ok(next.run(req).await)
    } else {
        tracing::warn!("Cron endpoint called with a wrong secret");
        Err(AppError::Unauthorized)
    }
}
