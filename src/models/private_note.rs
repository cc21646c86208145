use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::access_log::EntryType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PrivateNote {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_id: Uuid,
    pub entry_type: EntryType,
    pub note_content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPrivateNote {
    pub user_id: Uuid,
    pub entry_id: Uuid,
    pub entry_type: EntryType,
    pub note_content: String,
}
