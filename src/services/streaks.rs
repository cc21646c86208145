use chrono::{Duration, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Streaks {
    pub current_streak: i32,
    pub longest_streak: i32,
}

/// Current and longest runs of calendar-consecutive journaling days.
///
/// `dates` may be unsorted and contain duplicates. The current streak stays
/// alive if the latest entry is `today` or yesterday.
pub fn compute_streaks<I>(dates: I, today: NaiveDate) -> Streaks
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
    dates.sort_unstable();
    dates.dedup();

    let Some(&latest) = dates.last() else {
        return Streaks::default();
    };

    let one_day = Duration::days(1);

    let mut current_streak = 0;
    if latest == today || latest == today - one_day {
        current_streak = 1;
        for pair in dates.windows(2).rev() {
            if pair[1] - pair[0] == one_day {
                current_streak += 1;
            } else {
                break;
            }
        }
    }

    let mut longest_streak = 1;
    let mut run = 1;
    for pair in dates.windows(2) {
        if pair[1] - pair[0] == one_day {
            run += 1;
        } else {
            longest_streak = longest_streak.max(run);
            run = 1;
        }
    }
    longest_streak = longest_streak.max(run);

    Streaks {
        current_streak,
        longest_streak,
    }
}
