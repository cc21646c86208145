pub mod access_logs;
pub mod audio;
pub mod auth;
pub mod calendar;
pub mod cron;
pub mod health;
pub mod journal;
pub mod moods;
pub mod private_notes;
pub mod profile;
pub mod reflections;
pub mod statistics;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::access_log::{EntryType, NewAccessLog};
use crate::models::profile::Profile;
use crate::AppState;

/// Profile of an authenticated caller. A valid token without a profile row
/// means registration never completed.
pub(crate) async fn current_profile(state: &AppState, user_id: Uuid) -> AppResult<Profile> {
    state
        .store
        .get_profile(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))
}

/// Records that `reader` saw the given partner entries. Failures are logged
/// and swallowed; a read never fails because of its receipt.
pub(crate) async fn record_reads<I>(
    state: &AppState,
    reader: &Profile,
    entry_type: EntryType,
    owned_by: I,
) where
    I: IntoIterator<Item = (Uuid, Uuid)>,
{
    if !reader.allow_read_receipts {
        return;
    }

    let logs: Vec<NewAccessLog> = owned_by
        .into_iter()
        .filter(|(_, owner)| *owner != reader.id)
        .map(|(entry_id, owner)| NewAccessLog {
            entry_id,
            entry_type,
            accessed_by: reader.id,
            entry_owner: owner,
        })
        .collect();

    if logs.is_empty() {
        return;
    }

    let count = logs.len();
    if let Err(e) = state.store.insert_access_logs(logs).await {
        tracing::warn!(error = %e, user_id = %reader.id, count, "Failed to record entry reads");
    }
}
