use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DateRange, Store, StoreError, StoreResult};
use crate::models::access_log::{EntryAccessLog, EntryType, NewAccessLog};
use crate::models::journal::{JournalEntry, JournalEntryPatch, NewJournalEntry};
use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::models::private_note::{NewPrivateNote, PrivateNote};
use crate::models::profile::{NewProfile, Profile, ProfilePatch};
use crate::models::reflection::{CoupleKey, SharedReflection};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn upsert_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        let stored = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, email, full_name, invite_code)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                full_name = COALESCE(EXCLUDED.full_name, profiles.full_name),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(&profile.invite_code)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn find_profile_by_invite_code(&self, code: &str) -> StoreResult<Option<Profile>> {
        let profile =
            sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE invite_code = $1")
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        Ok(profile)
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Profile> {
        sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles SET
                full_name = COALESCE($2, full_name),
                allow_read_receipts = COALESCE($3, allow_read_receipts),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.full_name)
        .bind(patch.allow_read_receipts)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound("Profile"))
    }

    async fn link_partners(&self, a: Uuid, b: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let key = CoupleKey::new(a, b);

        // Rows are locked in key order so opposite invites cannot deadlock.
        // The guard is re-evaluated after a concurrent link commits.
        for (me, partner) in [(key.first(), key.second()), (key.second(), key.first())] {
            let linked = sqlx::query(
                r#"
                UPDATE profiles SET partner_id = $2, updated_at = NOW()
                WHERE id = $1 AND (partner_id IS NULL OR partner_id = $2)
                "#,
            )
            .bind(me)
            .bind(partner)
            .execute(&mut *tx)
            .await?;

            if linked.rows_affected() != 1 {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM profiles WHERE id = $1)",
                )
                .bind(me)
                .fetch_one(&mut *tx)
                .await?;
                return Err(if exists {
                    StoreError::Conflict("Already linked to another partner")
                } else {
                    StoreError::NotFound("Profile")
                });
            }
        }

        for (me, partner) in [(a, b), (b, a)] {
            sqlx::query(
                r#"
                UPDATE journal_entries
                SET shared_with = ARRAY[$2]::uuid[], updated_at = NOW()
                WHERE user_id = $1
                "#,
            )
            .bind(me)
            .bind(partner)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                UPDATE mood_entries
                SET shared_with = ARRAY[$2]::uuid[], updated_at = NOW()
                WHERE user_id = $1
                "#,
            )
            .bind(me)
            .bind(partner)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn upsert_journal_entry(&self, entry: NewJournalEntry) -> StoreResult<JournalEntry> {
        let stored = sqlx::query_as::<_, JournalEntry>(
            r#"
            INSERT INTO journal_entries
                (id, user_id, content, entry_date, mood, audio_url, shared_with)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, entry_date) DO UPDATE SET
                content = EXCLUDED.content,
                mood = EXCLUDED.mood,
                audio_url = EXCLUDED.audio_url,
                shared_with = EXCLUDED.shared_with,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.content)
        .bind(entry.date)
        .bind(entry.mood)
        .bind(entry.audio_url)
        .bind(entry.shared_with)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn get_journal_entry(&self, id: Uuid) -> StoreResult<Option<JournalEntry>> {
        let entry =
            sqlx::query_as::<_, JournalEntry>("SELECT * FROM journal_entries WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(entry)
    }

    async fn update_journal_entry(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: JournalEntryPatch,
    ) -> StoreResult<Option<JournalEntry>> {
        let entry = sqlx::query_as::<_, JournalEntry>(
            r#"
            UPDATE journal_entries SET
                content = COALESCE($3, content),
                mood = COALESCE($4, mood),
                audio_url = COALESCE($5, audio_url),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(patch.content)
        .bind(patch.mood)
        .bind(patch.audio_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entry)
    }

    async fn delete_journal_entry(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_visible_journal_entries(
        &self,
        viewer: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<JournalEntry>> {
        let entries = sqlx::query_as::<_, JournalEntry>(
            r#"
            SELECT * FROM journal_entries
            WHERE (user_id = $1 OR $1 = ANY(shared_with))
              AND ($2::date IS NULL OR entry_date >= $2)
              AND ($3::date IS NULL OR entry_date <= $3)
            ORDER BY entry_date DESC, created_at DESC
            "#,
        )
        .bind(viewer)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn journal_entries_on(&self, date: NaiveDate) -> StoreResult<Vec<JournalEntry>> {
        let entries = sqlx::query_as::<_, JournalEntry>(
            "SELECT * FROM journal_entries WHERE entry_date = $1",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn journal_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar::<_, NaiveDate>(
            r#"
            SELECT DISTINCT entry_date FROM journal_entries
            WHERE user_id = $1
            ORDER BY entry_date ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(dates)
    }

    async fn count_journal_entries(&self, user_id: Uuid) -> StoreResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM journal_entries WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn upsert_mood_entry(&self, entry: NewMoodEntry) -> StoreResult<MoodEntry> {
        let stored = sqlx::query_as::<_, MoodEntry>(
            r#"
            INSERT INTO mood_entries (id, user_id, mood, entry_date, shared_with)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, entry_date) DO UPDATE SET
                mood = EXCLUDED.mood,
                shared_with = EXCLUDED.shared_with,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(entry.mood)
        .bind(entry.date)
        .bind(entry.shared_with)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn list_visible_mood_entries(
        &self,
        viewer: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<MoodEntry>> {
        let entries = sqlx::query_as::<_, MoodEntry>(
            r#"
            SELECT * FROM mood_entries
            WHERE (user_id = $1 OR $1 = ANY(shared_with))
              AND ($2::date IS NULL OR entry_date >= $2)
              AND ($3::date IS NULL OR entry_date <= $3)
            ORDER BY entry_date DESC, created_at DESC
            "#,
        )
        .bind(viewer)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn find_reflections(
        &self,
        date: NaiveDate,
        key: CoupleKey,
    ) -> StoreResult<Vec<SharedReflection>> {
        let found = sqlx::query_as::<_, SharedReflection>(
            r#"
            SELECT * FROM shared_reflections
            WHERE reflection_date = $1 AND user_a = $2 AND user_b = $3
            "#,
        )
        .bind(date)
        .bind(key.first())
        .bind(key.second())
        .fetch_all(&self.pool)
        .await?;
        Ok(found)
    }

    async fn insert_reflection_if_absent(
        &self,
        date: NaiveDate,
        key: CoupleKey,
        reflection: &str,
    ) -> StoreResult<(SharedReflection, bool)> {
        let inserted = sqlx::query_as::<_, SharedReflection>(
            r#"
            INSERT INTO shared_reflections (id, reflection_date, user_a, user_b, reflection)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (reflection_date, user_a, user_b) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(date)
        .bind(key.first())
        .bind(key.second())
        .bind(reflection)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok((row, true));
        }

        // Lost the race: another writer stored this couple's reflection first.
        let existing = sqlx::query_as::<_, SharedReflection>(
            r#"
            SELECT * FROM shared_reflections
            WHERE reflection_date = $1 AND user_a = $2 AND user_b = $3
            "#,
        )
        .bind(date)
        .bind(key.first())
        .bind(key.second())
        .fetch_one(&self.pool)
        .await?;
        Ok((existing, false))
    }

    async fn list_reflections_for(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<SharedReflection>> {
        let found = sqlx::query_as::<_, SharedReflection>(
            r#"
            SELECT * FROM shared_reflections
            WHERE (user_a = $1 OR user_b = $1)
              AND ($2::date IS NULL OR reflection_date >= $2)
              AND ($3::date IS NULL OR reflection_date <= $3)
            ORDER BY reflection_date DESC
            "#,
        )
        .bind(user_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_all(&self.pool)
        .await?;
        Ok(found)
    }

    async fn count_reflections_for(&self, user_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shared_reflections WHERE user_a = $1 OR user_b = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert_access_logs(&self, logs: Vec<NewAccessLog>) -> StoreResult<()> {
        if logs.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for log in logs {
            sqlx::query(
                r#"
                INSERT INTO entry_access_logs (id, entry_id, entry_type, accessed_by, entry_owner)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(log.entry_id)
            .bind(log.entry_type)
            .bind(log.accessed_by)
            .bind(log.entry_owner)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_access_logs(
        &self,
        entry_id: Uuid,
        owner: Uuid,
    ) -> StoreResult<Vec<EntryAccessLog>> {
        let logs = sqlx::query_as::<_, EntryAccessLog>(
            r#"
            SELECT * FROM entry_access_logs
            WHERE entry_id = $1 AND entry_owner = $2
            ORDER BY accessed_at DESC
            "#,
        )
        .bind(entry_id)
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    async fn upsert_private_note(&self, note: NewPrivateNote) -> StoreResult<PrivateNote> {
        let stored = sqlx::query_as::<_, PrivateNote>(
            r#"
            INSERT INTO private_notes (id, user_id, entry_id, entry_type, note_content)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, entry_id, entry_type) DO UPDATE SET
                note_content = EXCLUDED.note_content,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(note.user_id)
        .bind(note.entry_id)
        .bind(note.entry_type)
        .bind(note.note_content)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    async fn get_private_note(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        entry_type: EntryType,
    ) -> StoreResult<Option<PrivateNote>> {
        let note = sqlx::query_as::<_, PrivateNote>(
            r#"
            SELECT * FROM private_notes
            WHERE user_id = $1 AND entry_id = $2 AND entry_type = $3
            "#,
        )
        .bind(user_id)
        .bind(entry_id)
        .bind(entry_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(note)
    }
}
