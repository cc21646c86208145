use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::models::access_log::EntryAccessLog;
use crate::AppState;

/// Read receipts for one of the caller's own entries. Entries owned by
/// someone else yield an empty list.
pub async fn list_for_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<Vec<EntryAccessLog>>> {
    let logs = state.store.list_access_logs(entry_id, auth_user.id).await?;
    Ok(Json(logs))
}
