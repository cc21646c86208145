use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use super::pairing::{needs_reflection, pair_for_reflection};
use super::reflection::ReflectionWriter;
use crate::db::{Store, StoreResult};
use crate::models::reflection::{CoupleKey, SharedReflection};

#[derive(Debug, Clone)]
pub struct ReflectionOutcome {
    pub reflection: SharedReflection,
    pub created: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub date: Option<NaiveDate>,
    pub eligible_pairs: usize,
    pub created: usize,
    pub already_present: usize,
    pub failed: usize,
}

/// Stores a reflection for one couple and day unless one already exists.
///
/// `text_a` is the journal text of `key.first()`. The existence check runs
/// before the model is called; the insert itself is idempotent, so a
/// concurrent writer that wins the race leaves its row in place.
pub async fn reflect_couple(
    store: &dyn Store,
    writer: &ReflectionWriter,
    date: NaiveDate,
    key: CoupleKey,
    text_a: &str,
    text_b: &str,
) -> StoreResult<ReflectionOutcome> {
    let existing = store.find_reflections(date, key).await?;
    if !needs_reflection(key, date, &existing) {
        if let Some(reflection) = existing.into_iter().next() {
            return Ok(ReflectionOutcome {
                reflection,
                created: false,
            });
        }
    }

    let text = writer.generate_reflection_text(text_a, text_b).await;
    let (reflection, created) = store.insert_reflection_if_absent(date, key, &text).await?;
    if !created {
        tracing::info!(%date, "Reflection was stored concurrently; keeping the existing one");
    }

    Ok(ReflectionOutcome { reflection, created })
}

/// Generates reflections for every couple where both partners journaled on `date`.
///
/// A failure for one couple is logged and does not stop the sweep.
pub async fn run_reflection_sweep(
    store: &dyn Store,
    writer: &ReflectionWriter,
    date: NaiveDate,
) -> StoreResult<SweepReport> {
    let entries = store.journal_entries_on(date).await?;
    let pairs = pair_for_reflection(&entries, date);

    let mut report = SweepReport {
        date: Some(date),
        eligible_pairs: pairs.len(),
        ..Default::default()
    };

    for pair in pairs {
        match reflect_couple(
            store,
            writer,
            date,
            pair.key,
            &pair.entry_a.content,
            &pair.entry_b.content,
        )
        .await
        {
            Ok(outcome) if outcome.created => report.created += 1,
            Ok(_) => report.already_present += 1,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    %date,
                    user_a = %pair.user_a(),
                    user_b = %pair.user_b(),
                    "Failed to store couple reflection"
                );
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Time until the next `hour_utc:00` strictly after `now`.
pub fn duration_until_next_run(now: DateTime<Utc>, hour_utc: u32) -> std::time::Duration {
    let Some(today_run) = now.date_naive().and_hms_opt(hour_utc, 0, 0) else {
        return std::time::Duration::from_secs(24 * 3600);
    };
    let mut next = Utc.from_utc_datetime(&today_run);
    if next <= now {
        next += Duration::days(1);
    }
    (next - now).to_std().unwrap_or_default()
}

/// Daily background sweep over yesterday's entries.
pub fn spawn_reflection_worker(store: Arc<dyn Store>, writer: ReflectionWriter, hour_utc: u32) {
    tokio::spawn(async move {
        loop {
            let wait = duration_until_next_run(Utc::now(), hour_utc);
            tracing::debug!(wait_secs = wait.as_secs(), "Reflection worker sleeping");
            tokio::time::sleep(wait).await;

            let yesterday = Utc::now().date_naive() - Duration::days(1);
            match run_reflection_sweep(store.as_ref(), &writer, yesterday).await {
                Ok(report) => {
                    tracing::info!(
                        date = %yesterday,
                        eligible = report.eligible_pairs,
                        created = report.created,
                        failed = report.failed,
                        "Reflection sweep finished"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "Reflection sweep failed");
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::journal::NewJournalEntry;
    use crate::services::llm::{GenerationOptions, TextGenerator};
    use crate::services::reflection::FALLBACK_REFLECTION;
    use crate::services::ProviderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for Counting {
        async fn generate(
            &self,
            _system: &str,
            _prompt: &str,
            _options: GenerationOptions,
        ) -> Result<String, ProviderError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("reflection #{}", n + 1))
        }
    }

    struct Broken;

    #[async_trait]
    impl TextGenerator for Broken {
        async fn generate(
            &self,
            _system: &str,
            _prompt: &str,
            _options: GenerationOptions,
        ) -> Result<String, ProviderError> {
            Err(ProviderError::Malformed("boom".into()))
        }
    }

    fn writer(generator: Arc<dyn TextGenerator>) -> ReflectionWriter {
        ReflectionWriter::new(
            generator,
            GenerationOptions::default(),
            std::time::Duration::from_secs(5),
        )
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 4).unwrap()
    }

    async fn write(store: &MemoryStore, user: Uuid, partner: Uuid, text: &str) {
        store
            .upsert_journal_entry(NewJournalEntry {
                user_id: user,
                date: day(),
                content: text.into(),
                mood: None,
                audio_url: None,
                shared_with: vec![partner],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sweep_creates_once_per_couple() {
        let store = MemoryStore::new();
        let generator = Arc::new(Counting::default());
        let writer = writer(generator.clone());
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        write(&store, a, b, "picnic").await;
        write(&store, b, a, "sunshine").await;
        write(&store, c, Uuid::new_v4(), "alone today").await;

        let first = run_reflection_sweep(&store, &writer, day()).await.unwrap();
        assert_eq!(first.eligible_pairs, 1);
        assert_eq!(first.created, 1);

        let second = run_reflection_sweep(&store, &writer, day()).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.already_present, 1);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        let stored = store.find_reflections(day(), CoupleKey::new(b, a)).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].reflection, "reflection #1");
    }

    #[tokio::test]
    async fn test_reflect_couple_uses_fallback_on_failure() {
        let store = MemoryStore::new();
        let writer = writer(Arc::new(Broken));
        let key = CoupleKey::new(Uuid::new_v4(), Uuid::new_v4());

        let outcome = reflect_couple(&store, &writer, day(), key, "a", "b").await.unwrap();
        assert!(outcome.created);
        assert_eq!(outcome.reflection.reflection, FALLBACK_REFLECTION);
    }

    #[tokio::test]
    async fn test_concurrent_reflections_store_one_row() {
        let store = MemoryStore::new();
        let writer = writer(Arc::new(Counting::default()));
        let key = CoupleKey::new(Uuid::new_v4(), Uuid::new_v4());

        let (x, y) = tokio::join!(
            reflect_couple(&store, &writer, day(), key, "a", "b"),
            reflect_couple(&store, &writer, day(), key, "a", "b"),
        );
        let (x, y) = (x.unwrap(), y.unwrap());

        assert_eq!(x.reflection.id, y.reflection.id);
        assert_eq!([x.created, y.created].iter().filter(|c| **c).count(), 1);
        assert_eq!(store.count_reflections_for(key.first()).await.unwrap(), 1);
    }

    #[test]
    fn test_next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 7, 4, 3, 30, 0).unwrap();
        assert_eq!(duration_until_next_run(now, 5).as_secs(), 90 * 60);
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 7, 4, 5, 0, 0).unwrap();
        assert_eq!(duration_until_next_run(now, 5).as_secs(), 24 * 3600);

        let now = Utc.with_ymd_and_hms(2024, 7, 4, 23, 0, 0).unwrap();
        assert_eq!(duration_until_next_run(now, 5).as_secs(), 6 * 3600);
    }
}
