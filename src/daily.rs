//! Daily question selection.
//!
//! Everyone sees the same question on the same calendar day: the pool is
//! ordered by id and indexed with `day_count mod N`. Calendar days are taken
//! in a fixed UTC offset (see `calendar_day`), so the same instant maps to
//! the same day for every client configured with that offset.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};

use crate::domain::Question;

// 1970-01-01 counted from 0001-01-01 (which is day 1).
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// Calendar day of `now` in the given offset.
pub fn calendar_day(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
  now.with_timezone(&offset).date_naive()
}

/// Calendar day of a stored Unix-millis timestamp, `None` when out of range.
pub fn calendar_day_of_millis(millis: i64, offset: FixedOffset) -> Option<NaiveDate> {
  Utc.timestamp_millis_opt(millis).single().map(|t| calendar_day(t, offset))
}

/// Days elapsed since 1970-01-01.
pub fn day_count(date: NaiveDate) -> i64 {
  i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
}

/// Index of today's question in a pool of `pool_len`; `None` for an empty pool.
pub fn daily_index(day_count: i64, pool_len: usize) -> Option<usize> {
  if pool_len == 0 {
    return None;
  }
  let n = i64::try_from(pool_len).ok()?;
  usize::try_from(day_count.rem_euclid(n)).ok()
}

/// Carry the user's local progress over a freshly fetched copy of the same question.
pub fn merge_local_progress(mut fresh: Question, existing: Option<&Question>) -> Question {
  match existing {
    Some(local) if local.id == fresh.id => {
      fresh.is_solved = local.is_solved;
      fresh.is_bookmarked = local.is_bookmarked;
      fresh.user_code = local.user_code.clone();
    }
    _ => {
      fresh.is_solved = false;
      fresh.is_bookmarked = false;
      fresh.user_code = None;
    }
  }
  fresh
}

#[cfg(test)]
mod tests {
  use super::*;

  fn question(id: &str) -> Question {
    Question {
      id: id.into(),
      title: "Two Sum".into(),
      description: "Find two numbers adding up to a target.".into(),
      difficulty: "Easy".into(),
      topic: "Arrays".into(),
      time_estimate: "15 mins".into(),
      starter_code: "fn two_sum() {}".into(),
      solution_code: "fn two_sum() { /* ... */ }".into(),
      is_solved: false,
      is_bookmarked: false,
      user_code: None,
      date: 0,
    }
  }

  #[test]
  fn index_is_day_count_mod_pool_size() {
    assert_eq!(daily_index(37, 5), Some(2));
    assert_eq!(daily_index(0, 1), Some(0));
    assert_eq!(daily_index(10, 0), None);
  }

  #[test]
  fn index_always_within_pool() {
    for n in 1..=13usize {
      for day in [-1_000_000i64, -31, -1, 0, 1, 7, 365, 20_000, i64::MAX, i64::MIN] {
        let idx = daily_index(day, n).expect("non-empty pool");
        assert!(idx < n, "day={day} n={n} idx={idx}");
      }
    }
  }

  #[test]
  fn same_day_maps_to_same_index() {
    let morning = Utc.with_ymd_and_hms(2024, 3, 5, 1, 0, 0).unwrap();
    let evening = Utc.with_ymd_and_hms(2024, 3, 5, 23, 0, 0).unwrap();
    let utc = FixedOffset::east_opt(0).unwrap();
    let a = day_count(calendar_day(morning, utc));
    let b = day_count(calendar_day(evening, utc));
    assert_eq!(daily_index(a, 7), daily_index(b, 7));
  }

  #[test]
  fn day_count_starts_at_unix_epoch() {
    assert_eq!(day_count(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()), 0);
    assert_eq!(day_count(NaiveDate::from_ymd_opt(1970, 2, 7).unwrap()), 37);
    assert_eq!(day_count(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()), -1);
  }

  #[test]
  fn offset_moves_the_calendar_day() {
    let late = Utc.with_ymd_and_hms(2024, 3, 5, 23, 30, 0).unwrap();
    let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
    assert_eq!(calendar_day(late, tokyo), NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
  }

  #[test]
  fn refetch_keeps_solved_bookmark_and_code() {
    let mut local = question("q1");
    local.is_solved = true;
    local.is_bookmarked = true;
    local.user_code = Some("my answer".into());

    let merged = merge_local_progress(question("q1"), Some(&local));
    assert!(merged.is_solved);
    assert!(merged.is_bookmarked);
    assert_eq!(merged.user_code.as_deref(), Some("my answer"));
  }

  #[test]
  fn new_question_starts_without_progress() {
    let mut fresh = question("q2");
    fresh.is_solved = true;
    let merged = merge_local_progress(fresh, None);
    assert!(!merged.is_solved);
    assert!(!merged.is_bookmarked);
    assert!(merged.user_code.is_none());
  }
}
