use std::collections::HashMap;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::journal::JournalEntry;
use crate::models::reflection::{CoupleKey, SharedReflection};

/// Two partners who both journaled on the same day.
///
/// `entry_a` belongs to `key.first()` and `entry_b` to `key.second()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionPair {
    pub key: CoupleKey,
    pub entry_a: JournalEntry,
    pub entry_b: JournalEntry,
}

impl ReflectionPair {
    pub fn user_a(&self) -> Uuid {
        self.key.first()
    }

    pub fn user_b(&self) -> Uuid {
        self.key.second()
    }
}

/// Groups one day's journal entries into couples where both partners wrote.
///
/// Each entry is keyed by its owner and the first id in `shared_with`;
/// entries that are not shared, or are dated differently, are ignored. A
/// couple qualifies only with exactly two entries from two distinct owners.
/// Any other grouping is skipped. The result has no particular order.
pub fn pair_for_reflection(entries: &[JournalEntry], date: NaiveDate) -> Vec<ReflectionPair> {
    let mut couples: HashMap<CoupleKey, Vec<&JournalEntry>> = HashMap::new();

    for entry in entries.iter().filter(|e| e.date == date) {
        let Some(partner) = entry.partner() else {
            continue;
        };
        couples
            .entry(CoupleKey::new(entry.user_id, partner))
            .or_default()
            .push(entry);
    }

    couples
        .into_iter()
        .filter_map(|(key, group)| match group.as_slice() {
            [x, y] if x.user_id != y.user_id => {
                let (a, b) = if x.user_id == key.first() { (x, y) } else { (y, x) };
                Some(ReflectionPair {
                    key,
                    entry_a: (*a).clone(),
                    entry_b: (*b).clone(),
                })
            }
            _ => None,
        })
        .collect()
}

/// `false` when `existing` already holds this couple's reflection for `date`.
pub fn needs_reflection(key: CoupleKey, date: NaiveDate, existing: &[SharedReflection]) -> bool {
    !existing
        .iter()
        .any(|r| r.date == date && r.couple_key() == key)
}
