use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DateRange, Store, StoreError, StoreResult};
use crate::models::access_log::{EntryAccessLog, EntryType, NewAccessLog};
use crate::models::journal::{JournalEntry, JournalEntryPatch, NewJournalEntry};
use crate::models::mood::{MoodEntry, NewMoodEntry};
use crate::models::private_note::{NewPrivateNote, PrivateNote};
use crate::models::profile::{NewProfile, Profile, ProfilePatch};
use crate::models::reflection::{CoupleKey, SharedReflection};

/// In-process store with the same key semantics as the Postgres schema.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    profiles: HashMap<Uuid, Profile>,
    journal: HashMap<Uuid, JournalEntry>,
    moods: HashMap<Uuid, MoodEntry>,
    reflections: HashMap<(NaiveDate, CoupleKey), SharedReflection>,
    access_logs: Vec<EntryAccessLog>,
    notes: HashMap<(Uuid, Uuid, EntryType), PrivateNote>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn visible_to(owner: Uuid, shared_with: &[Uuid], viewer: Uuid) -> bool {
    owner == viewer || shared_with.contains(&viewer)
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.inner.read().await.profiles.get(&id).cloned())
    }

    async fn upsert_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let stored = inner
            .profiles
            .entry(profile.id)
            .and_modify(|p| {
                p.email = profile.email.clone();
                if profile.full_name.is_some() {
                    p.full_name = profile.full_name.clone();
                }
                p.updated_at = now;
            })
            .or_insert_with(|| Profile {
                id: profile.id,
                email: profile.email.clone(),
                full_name: profile.full_name.clone(),
                invite_code: Some(profile.invite_code.clone()),
                partner_id: None,
                allow_read_receipts: true,
                created_at: now,
                updated_at: now,
            });
        Ok(stored.clone())
    }

    async fn find_profile_by_invite_code(&self, code: &str) -> StoreResult<Option<Profile>> {
        Ok(self
            .inner
            .read()
            .await
            .profiles
            .values()
            .find(|p| p.invite_code.as_deref() == Some(code))
            .cloned())
    }

    async fn update_profile(&self, id: Uuid, patch: ProfilePatch) -> StoreResult<Profile> {
        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .get_mut(&id)
            .ok_or(StoreError::NotFound("Profile"))?;
        if let Some(name) = patch.full_name {
            profile.full_name = Some(name);
        }
        if let Some(allow) = patch.allow_read_receipts {
            profile.allow_read_receipts = allow;
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn link_partners(&self, a: Uuid, b: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let (Some(pa), Some(pb)) = (inner.profiles.get(&a), inner.profiles.get(&b)) else {
            return Err(StoreError::NotFound("Profile"));
        };
        if pa.partner_id.is_some_and(|p| p != b) || pb.partner_id.is_some_and(|p| p != a) {
            return Err(StoreError::Conflict("Already linked to another partner"));
        }
        let now = Utc::now();
        for (me, partner) in [(a, b), (b, a)] {
            if let Some(p) = inner.profiles.get_mut(&me) {
                p.partner_id = Some(partner);
                p.updated_at = now;
            }
        }
        for entry in inner.journal.values_mut() {
            if let Some(partner) = CoupleKey::new(a, b).partner_of(entry.user_id) {
                entry.shared_with = vec![partner];
                entry.updated_at = now;
            }
        }
        for entry in inner.moods.values_mut() {
            if let Some(partner) = CoupleKey::new(a, b).partner_of(entry.user_id) {
                entry.shared_with = vec![partner];
                entry.updated_at = now;
            }
        }
        Ok(())
    }

    async fn upsert_journal_entry(&self, entry: NewJournalEntry) -> StoreResult<JournalEntry> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let existing = inner
            .journal
            .values_mut()
            .find(|e| e.user_id == entry.user_id && e.date == entry.date);

        if let Some(existing) = existing {
            existing.content = entry.content;
            existing.mood = entry.mood;
            existing.audio_url = entry.audio_url;
            existing.shared_with = entry.shared_with;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let stored = JournalEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            content: entry.content,
            date: entry.date,
            mood: entry.mood,
            audio_url: entry.audio_url,
            shared_with: entry.shared_with,
            created_at: now,
            updated_at: now,
        };
        inner.journal.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_journal_entry(&self, id: Uuid) -> StoreResult<Option<JournalEntry>> {
        Ok(self.inner.read().await.journal.get(&id).cloned())
    }

    async fn update_journal_entry(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: JournalEntryPatch,
    ) -> StoreResult<Option<JournalEntry>> {
        let mut inner = self.inner.write().await;
        let Some(entry) = inner.journal.get_mut(&id).filter(|e| e.user_id == owner) else {
            return Ok(None);
        };
        if let Some(content) = patch.content {
            entry.content = content;
        }
        if let Some(mood) = patch.mood {
            entry.mood = Some(mood);
        }
        if let Some(audio_url) = patch.audio_url {
            entry.audio_url = Some(audio_url);
        }
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn delete_journal_entry(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner.journal.get(&id).is_some_and(|e| e.user_id == owner);
        if owned {
            inner.journal.remove(&id);
        }
        Ok(owned)
    }

    async fn list_visible_journal_entries(
        &self,
        viewer: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<JournalEntry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<JournalEntry> = inner
            .journal
            .values()
            .filter(|e| visible_to(e.user_id, &e.shared_with, viewer) && range.contains(e.date))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(entries)
    }

    async fn journal_entries_on(&self, date: NaiveDate) -> StoreResult<Vec<JournalEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .journal
            .values()
            .filter(|e| e.date == date)
            .cloned()
            .collect())
    }

    async fn journal_dates(&self, user_id: Uuid) -> StoreResult<Vec<NaiveDate>> {
        let inner = self.inner.read().await;
        let mut dates: Vec<NaiveDate> = inner
            .journal
            .values()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.date)
            .collect();
        dates.sort_unstable();
        dates.dedup();
        Ok(dates)
    }

    async fn count_journal_entries(&self, user_id: Uuid) -> StoreResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner.journal.values().filter(|e| e.user_id == user_id).count() as i64)
    }

    async fn upsert_mood_entry(&self, entry: NewMoodEntry) -> StoreResult<MoodEntry> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let existing = inner
            .moods
            .values_mut()
            .find(|e| e.user_id == entry.user_id && e.date == entry.date);

        if let Some(existing) = existing {
            existing.mood = entry.mood;
            existing.shared_with = entry.shared_with;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let stored = MoodEntry {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            mood: entry.mood,
            date: entry.date,
            shared_with: entry.shared_with,
            created_at: now,
            updated_at: now,
        };
        inner.moods.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_visible_mood_entries(
        &self,
        viewer: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<MoodEntry>> {
        let inner = self.inner.read().await;
        let mut entries: Vec<MoodEntry> = inner
            .moods
            .values()
            .filter(|e| visible_to(e.user_id, &e.shared_with, viewer) && range.contains(e.date))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(entries)
    }

    async fn find_reflections(
        &self,
        date: NaiveDate,
        key: CoupleKey,
    ) -> StoreResult<Vec<SharedReflection>> {
        let inner = self.inner.read().await;
        Ok(inner.reflections.get(&(date, key)).cloned().into_iter().collect())
    }

    async fn insert_reflection_if_absent(
        &self,
        date: NaiveDate,
        key: CoupleKey,
        reflection: &str,
    ) -> StoreResult<(SharedReflection, bool)> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.reflections.get(&(date, key)) {
            return Ok((existing.clone(), false));
        }
        let stored = SharedReflection {
            id: Uuid::new_v4(),
            date,
            user_a: key.first(),
            user_b: key.second(),
            reflection: reflection.to_string(),
            created_at: Utc::now(),
        };
        inner.reflections.insert((date, key), stored.clone());
        Ok((stored, true))
    }

    async fn list_reflections_for(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> StoreResult<Vec<SharedReflection>> {
        let inner = self.inner.read().await;
        let mut found: Vec<SharedReflection> = inner
            .reflections
            .iter()
            .filter(|((date, key), _)| key.contains(user_id) && range.contains(*date))
            .map(|(_, r)| r.clone())
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(found)
    }

    async fn count_reflections_for(&self, user_id: Uuid) -> StoreResult<i64> {
        let inner = self.inner.read().await;
        Ok(inner
            .reflections
            .keys()
            .filter(|(_, key)| key.contains(user_id))
            .count() as i64)
    }

    async fn insert_access_logs(&self, logs: Vec<NewAccessLog>) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        inner.access_logs.extend(logs.into_iter().map(|l| EntryAccessLog {
            id: Uuid::new_v4(),
            entry_id: l.entry_id,
            entry_type: l.entry_type,
            accessed_by: l.accessed_by,
            entry_owner: l.entry_owner,
            accessed_at: now,
        }));
        Ok(())
    }

    async fn list_access_logs(
        &self,
        entry_id: Uuid,
        owner: Uuid,
    ) -> StoreResult<Vec<EntryAccessLog>> {
        let inner = self.inner.read().await;
        let mut logs: Vec<EntryAccessLog> = inner
            .access_logs
            .iter()
            .filter(|l| l.entry_id == entry_id && l.entry_owner == owner)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.accessed_at.cmp(&a.accessed_at));
        Ok(logs)
    }

    async fn upsert_private_note(&self, note: NewPrivateNote) -> StoreResult<PrivateNote> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let stored = inner
            .notes
            .entry((note.user_id, note.entry_id, note.entry_type))
            .and_modify(|n| {
                n.note_content = note.note_content.clone();
                n.updated_at = now;
            })
            .or_insert_with(|| PrivateNote {
                id: Uuid::new_v4(),
                user_id: note.user_id,
                entry_id: note.entry_id,
                entry_type: note.entry_type,
                note_content: note.note_content.clone(),
                created_at: now,
                updated_at: now,
            });
        Ok(stored.clone())
    }

    async fn get_private_note(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        entry_type: EntryType,
    ) -> StoreResult<Option<PrivateNote>> {
        let inner = self.inner.read().await;
        Ok(inner.notes.get(&(user_id, entry_id, entry_type)).cloned())
    }
}
