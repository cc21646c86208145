//! Request/response bodies of the HTTP API.
//!
//! Conventions:
//! - request types are validated with `validator` derives before use
//! - response types are plain `Serialize` structs; stored rows from
//!   `models` are returned as-is where their shape already fits

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::access_log::EntryType;
use crate::models::journal::{JournalEntry, JournalEntryPatch};
use crate::models::mood::MoodEntry;
use crate::models::profile::{Profile, ProfilePatch};
use crate::models::reflection::SharedReflection;
use crate::services::reflection_job::SweepReport;

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

// ============================================================================
// Common
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `?date_from=YYYY-MM-DD&date_to=YYYY-MM-DD`, both optional and inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

// ============================================================================
// Auth & profile
// ============================================================================

/// POST /api/register
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"), length(max = 254))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub full_name: Option<String>,
}

/// POST /api/login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: Profile,
    pub message: String,
}

/// PATCH /api/profile
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub full_name: Option<String>,
    pub allow_read_receipts: Option<bool>,
}

impl From<UpdateProfileRequest> for ProfilePatch {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            full_name: req.full_name,
            allow_read_receipts: req.allow_read_receipts,
        }
    }
}

/// POST /api/invite-partner
#[derive(Debug, Deserialize, Validate)]
pub struct InvitePartnerRequest {
    #[validate(length(min = 1, max = 32), custom = "not_blank")]
    pub invite_code: String,
}

#[derive(Debug, Serialize)]
pub struct InvitePartnerResponse {
    pub message: String,
    pub partner_name: String,
}

// ============================================================================
// Journal & mood entries
// ============================================================================

/// POST /api/journal-entries. Replaces the caller's entry for `date` if any.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateJournalEntryRequest {
    #[validate(length(max = 20000), custom = "not_blank")]
    pub content: String,
    pub date: NaiveDate,
    #[validate(length(min = 1, max = 50))]
    pub mood: Option<String>,
    #[validate(url)]
    pub audio_url: Option<String>,
}

/// PUT /api/journal-entries/{id}
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateJournalEntryRequest {
    #[validate(length(max = 20000), custom = "not_blank")]
    pub content: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub mood: Option<String>,
    #[validate(url)]
    pub audio_url: Option<String>,
}

impl From<UpdateJournalEntryRequest> for JournalEntryPatch {
    fn from(req: UpdateJournalEntryRequest) -> Self {
        Self {
            content: req.content,
            mood: req.mood,
            audio_url: req.audio_url,
        }
    }
}

/// POST /api/mood-entries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMoodEntryRequest {
    #[validate(length(min = 1, max = 50), custom = "not_blank")]
    pub mood: String,
    pub date: NaiveDate,
}

// ============================================================================
// Reflections
// ============================================================================

/// POST /api/generate-reflection?reflection_date=YYYY-MM-DD
#[derive(Debug, Deserialize)]
pub struct GenerateReflectionQuery {
    pub reflection_date: NaiveDate,
}

/// POST /api/backfill-reflection
#[derive(Debug, Deserialize)]
pub struct BackfillReflectionRequest {
    pub date: NaiveDate,
    pub user_id: Uuid,
    pub partner_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ReflectionResponse {
    pub reflection: String,
    pub date: NaiveDate,
    /// `false` when an earlier reflection for this day was returned.
    pub created: bool,
}

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub message: String,
    #[serde(flatten)]
    pub report: SweepReport,
}

// ============================================================================
// Calendar & statistics
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub user_entry: Option<JournalEntry>,
    pub partner_entry: Option<JournalEntry>,
    pub shared_reflection: Option<SharedReflection>,
    pub user_mood: Option<MoodEntry>,
    pub partner_mood: Option<MoodEntry>,
}

#[derive(Debug, Serialize)]
pub struct Statistics {
    pub total_entries: i64,
    pub partner_entries: i64,
    /// Days with a shared reflection.
    pub shared_days: i64,
    pub total_reflections: i64,
    pub current_streak: i32,
    pub longest_streak: i32,
}

// ============================================================================
// Audio & private notes
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AudioUploadResponse {
    pub audio_url: String,
    pub filename: String,
}

/// POST /api/private-notes
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePrivateNoteRequest {
    pub entry_id: Uuid,
    pub entry_type: EntryType,
    #[validate(length(max = 5000), custom = "not_blank")]
    pub note_content: String,
}

/// GET /api/private-notes/{entry_id}?entry_type=journal
#[derive(Debug, Deserialize)]
pub struct PrivateNoteQuery {
    pub entry_type: EntryType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_journal_content_rejected() {
        let req = CreateJournalEntryRequest {
            content: "   ".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            mood: None,
            audio_url: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            email: "pat@example.com".into(),
            password: "secret123".into(),
            full_name: Some("Pat".into()),
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            email: "not-an-email".into(),
            password: "123".into(),
            full_name: None,
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_update_request_optional_fields() {
        let req = UpdateJournalEntryRequest {
            content: None,
            mood: Some("happy".into()),
            audio_url: Some("not a url".into()),
        };
        assert!(req.validate().is_err());
    }
}
