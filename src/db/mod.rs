//! Storage-agnostic persistence boundary.
//!
//! Handlers and background jobs only talk to [`Store`]; the concrete backend
//! is picked at startup (`PgStore` in production, `MemoryStore` for tests and
//! local runs). Both adapters enforce the same natural keys:
//!
//! - one journal entry and one mood entry per `(user_id, date)`
//! - one shared reflection per `(date, CoupleKey)`
//! - one private note per `(user_id, entry_id, entry_type)`

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::access_log::{EntryAccessLog, EntryType, NewAccessLog};
use crate::models::journal::{JournalEntry, JournalEntryPatch, NewJournalEntry};
use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::models::private_note::{NewPrivateNote, PrivateNote};
use crate::models::profile::{NewProfile, Profile, ProfilePatch};
use crate::models::reflection::{CoupleKey, SharedReflection};

pub mod memory;
pub mod pool;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness rule of the data model would be broken by the write.
    #[error("{0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for crate::error::AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => {
                crate::error::AppError::NotFound(format!("{} not found", what))
            }
            StoreError::Conflict(msg) => crate::error::AppError::Conflict(msg.to_string()),
            StoreError::Database(e) => crate::error::AppError::Database(e),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Inclusive, optionally open-ended date range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // Profiles
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;
    /// Inserts the profile, or refreshes email/name if the id already exists.
    /// An existing invite code is kept.
    async fn upsert_profile(&self, profile: NewProfile) -> StoreResult<Profile>;
    async fn find_profile_by_invite_code(&self, code: &str) -> StoreResult<Option<Profile>>;
    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Profile>;
    /// Links `a` and `b` as partners and shares every existing journal and
    /// mood entry of each with the other, atomically. Fails with
    /// `StoreError::Conflict` if either already has a different partner.
    async fn link_partners(&self, a: Uuid, b: Uuid) -> StoreResult<()>;

    // Journal entries
    async fn upsert_journal_entry(&self, entry: NewJournalEntry) -> StoreResult<JournalEntry>;
    async fn get_journal_entry(&self, id: Uuid) -> StoreResult<Option<JournalEntry>>;
    /// Applies `patch` to an entry owned by `owner`. `None` if no such entry.
    async fn update_journal_entry(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: JournalEntryPatch,
    ) -> StoreResult<Option<JournalEntry>>;
    async fn delete_journal_entry(&self, owner: Uuid, id: Uuid) -> StoreResult<bool>;
    /// Entries owned by `viewer` plus entries shared with `viewer`, newest first.
    async fn list_visible_journal_entries(
        &self,
        viewer: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<JournalEntry>>;
    /// Every user's entries for one date.
    async fn journal_entries_on(&self, date: NaiveDate) -> StoreResult<Vec<JournalEntry>>;
    async fn journal_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>>;
    async fn count_journal_entries(&self, user_id: Uuid) -> StoreResult<i64>;

    // Mood entries
    async fn upsert_mood_entry(&self, entry: NewMoodEntry) -> StoreResult<MoodEntry>;
    async fn list_visible_mood_entries(
        &self,
        viewer: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<MoodEntry>>;

    // Shared reflections
    async fn find_reflections(
        &self,
        date: NaiveDate,
        key: CoupleKey,
    ) -> StoreResult<Vec<SharedReflection>>;
    /// Idempotent insert keyed by `(date, key)`. Returns the stored row and
    /// whether this call created it.
    async fn insert_reflection_if_absent(
        &self,
        date: NaiveDate,
        key: CoupleKey,
        reflection: &str,
    ) -> StoreResult<(SharedReflection, bool)>;
    async fn list_reflections_for(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<SharedReflection>>;
    async fn count_reflections_for(&self, user_id: Uuid) -> StoreResult<i64>;

    // Read receipts
    async fn insert_access_logs(&self, logs: Vec<NewAccessLog>) -> StoreResult<()>;
    async fn list_access_logs(
        &self,
        entry_id: Uuid,
        owner: Uuid,
    ) -> StoreResult<Vec<EntryAccessLog>>;

    // Private notes
    async fn upsert_private_note(&self, note: NewPrivateNote) -> StoreResult<PrivateNote>;
    async fn get_private_note(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        entry_type: EntryType,
    ) -> StoreResult<Option<PrivateNote>>;
}
