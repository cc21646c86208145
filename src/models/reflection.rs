use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Order-independent identity of a couple.
///
/// The two ids are stored sorted, so `CoupleKey::new(a, b) == CoupleKey::new(b, a)`.
/// `Uuid` ordering is byte-wise, which matches lexicographic order of the
/// lowercase hyphenated string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoupleKey {
    first: Uuid,
    second: Uuid,
}

impl CoupleKey {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> Uuid {
        self.first
    }

    pub fn second(&self) -> Uuid {
        self.second
    }

    pub fn contains(&self, user_id: Uuid) -> bool {
        self.first == user_id || self.second == user_id
    }

    /// The other member of the couple, or `None` if `user_id` is not part of it.
    pub fn partner_of(&self, user_id: Uuid) -> Option<Uuid> {
        if self.first == user_id {
            Some(self.second)
        } else if self.second == user_id {
            Some(self.first)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SharedReflection {
    pub id: Uuid,
    #[sqlx(rename = "reflection_date")]
    pub date: NaiveDate,
    pub user_a: Uuid,
    pub user_b: Uuid,
    pub reflection: String,
    pub created_at: DateTime<Utc>,
}

impl SharedReflection {
    pub fn couple_key(&self) -> CoupleKey {
        CoupleKey::new(self.user_a, self.user_b)
    }
}
