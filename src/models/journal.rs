use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    #[sqlx(rename = "entry_date")]
    pub date: NaiveDate,
    pub mood: Option<String>,
    pub audio_url: Option<String>,
    pub shared_with: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    /// The partner this entry is visible to, if any.
    pub fn partner(&self) -> Option<Uuid> {
        self.shared_with.first().copied()
    }
}

/// Insert-or-replace payload keyed by `(user_id, date)`.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub content: String,
    pub mood: Option<String>,
    pub audio_url: Option<String>,
    pub shared_with: Vec<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct JournalEntryPatch {
    pub content: Option<String>,
    pub mood: Option<String>,
    pub audio_url: Option<String>,
}

impl JournalEntryPatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.mood.is_none() && self.audio_url.is_none()
    }
}
