use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "entry_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Journal,
    Mood,
}

/// Read receipt: `accessed_by` opened an entry owned by `entry_owner`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EntryAccessLog {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub entry_type: EntryType,
    pub accessed_by: Uuid,
    pub entry_owner: Uuid,
    pub accessed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccessLog {
    pub entry_id: Uuid,
    pub entry_type: EntryType,
    pub accessed_by: Uuid,
    pub entry_owner: Uuid,
}
