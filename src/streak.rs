//! Streak continuity and the weekly progress strip.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Utc};

use crate::daily::{calendar_day, calendar_day_of_millis};
use crate::domain::User;

/// Points awarded for every accepted solve.
pub const POINTS_PER_SOLVE: u32 = 10;

/// Where the last solve sits relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastSolve {
  Never,
  Today,
  Yesterday,
  Earlier,
}

pub fn classify_last_solve(last_solved_millis: i64, today: NaiveDate, offset: FixedOffset) -> LastSolve {
  if last_solved_millis == 0 {
    return LastSolve::Never;
  }
  match calendar_day_of_millis(last_solved_millis, offset) {
    Some(day) if day == today => LastSolve::Today,
    Some(day) if day.checked_add_days(Days::new(1)) == Some(today) => LastSolve::Yesterday,
    // Older days, clock skew into the future and unreadable stamps all break the chain.
    _ => LastSolve::Earlier,
  }
}

/// Apply one accepted solve of `question_id` at `now` to `user`.
///
/// Solving a question again on the day it was already solved changes
/// nothing: the user comes back as-is and no points are awarded.
pub fn apply_solve(user: &User, question_id: &str, now: DateTime<Utc>, offset: FixedOffset, points: u32) -> User {
  let today = calendar_day(now, offset);
  let last = classify_last_solve(user.last_solved_date, today, offset);
  if last == LastSolve::Today && user.solved_question_ids.iter().any(|id| id == question_id) {
    return user.clone();
  }
  let current_streak = match last {
    LastSolve::Today => user.current_streak.max(1),
    LastSolve::Yesterday => user.current_streak.saturating_add(1),
    LastSolve::Never | LastSolve::Earlier => 1,
  };

  let mut solved = Vec::with_capacity(user.solved_question_ids.len() + 1);
  for id in &user.solved_question_ids {
    if !solved.contains(id) {
      solved.push(id.clone());
    }
  }
  if !solved.iter().any(|id| id == question_id) {
    solved.push(question_id.to_string());
  }

  User {
    current_streak,
    last_solved_date: now.timestamp_millis(),
    total_solved: u32::try_from(solved.len()).unwrap_or(u32::MAX),
    solved_question_ids: solved,
    score: user.score.saturating_add(points),
    ..user.clone()
  }
}

/// Monday-first strip of the current week: today and the `streak - 1` days
/// before it (within this week) are lit when the user solved today.
pub fn weekly_progress(user: &User, now: DateTime<Utc>, offset: FixedOffset) -> [bool; 7] {
  let mut week = [false; 7];
  let today = calendar_day(now, offset);
  if classify_last_solve(user.last_solved_date, today, offset) != LastSolve::Today {
    return week;
  }
  let today_idx = today.weekday().num_days_from_monday() as usize;
  let lit = (user.current_streak.max(1) as usize).min(today_idx + 1);
  for slot in week.iter_mut().take(today_idx + 1).skip(today_idx + 1 - lit) {
    *slot = true;
  }
  week
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).unwrap()
  }

  fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
  }

  fn user_last_solved(when: Option<DateTime<Utc>>, streak: u32) -> User {
    User {
      uid: "u1".into(),
      email: "ada@example.com".into(),
      current_streak: streak,
      last_solved_date: when.map(|t| t.timestamp_millis()).unwrap_or(0),
      ..User::default()
    }
  }

  // 2024-01-01 is a Monday.
  #[test]
  fn monday_then_tuesday_extends_streak() {
    let user = user_last_solved(Some(at(2024, 1, 1, 20)), 4);
    let next = apply_solve(&user, "q1", at(2024, 1, 2, 8), utc(), POINTS_PER_SOLVE);
    assert_eq!(next.current_streak, 5);
  }

  #[test]
  fn monday_then_thursday_resets_streak() {
    let user = user_last_solved(Some(at(2024, 1, 1, 20)), 5);
    let next = apply_solve(&user, "q1", at(2024, 1, 4, 8), utc(), POINTS_PER_SOLVE);
    assert_eq!(next.current_streak, 1);
  }

  #[test]
  fn first_solve_starts_streak_at_one() {
    let user = user_last_solved(None, 0);
    let next = apply_solve(&user, "q1", at(2024, 1, 4, 8), utc(), POINTS_PER_SOLVE);
    assert_eq!(next.current_streak, 1);
    assert_eq!(next.total_solved, 1);
    assert_eq!(next.score, POINTS_PER_SOLVE);
  }

  #[test]
  fn two_solves_same_day_count_once() {
    let user = user_last_solved(Some(at(2024, 1, 1, 9)), 2);
    let first = apply_solve(&user, "q1", at(2024, 1, 2, 9), utc(), POINTS_PER_SOLVE);
    let second = apply_solve(&first, "q2", at(2024, 1, 2, 22), utc(), POINTS_PER_SOLVE);
    assert_eq!(first.current_streak, 3);
    assert_eq!(second.current_streak, 3);
    assert_eq!(second.solved_question_ids, vec!["q1".to_string(), "q2".to_string()]);
    assert_eq!(second.total_solved, 2);
  }

  #[test]
  fn same_day_uses_calendar_not_24h_window() {
    // 23:00 -> 01:00 next day is only two hours apart but a new day.
    let user = user_last_solved(Some(at(2024, 1, 1, 23)), 1);
    let next = apply_solve(&user, "q2", at(2024, 1, 2, 1), utc(), POINTS_PER_SOLVE);
    assert_eq!(next.current_streak, 2);
  }

  #[test]
  fn year_boundary_is_consecutive() {
    let user = user_last_solved(Some(at(2023, 12, 31, 12)), 7);
    let next = apply_solve(&user, "q9", at(2024, 1, 1, 12), utc(), POINTS_PER_SOLVE);
    assert_eq!(next.current_streak, 8);
  }

  #[test]
  fn same_day_of_year_in_another_year_is_a_gap() {
    let user = user_last_solved(Some(at(2023, 1, 2, 12)), 7);
    let next = apply_solve(&user, "q9", at(2024, 1, 2, 12), utc(), POINTS_PER_SOLVE);
    assert_eq!(next.current_streak, 1);
  }

  #[test]
  fn resolving_does_not_duplicate_ids() {
    let mut user = user_last_solved(Some(at(2024, 1, 1, 9)), 1);
    user.solved_question_ids = vec!["q1".into(), "q1".into()];
    user.total_solved = 2;
    user.score = 20;
    let next = apply_solve(&user, "q1", at(2024, 1, 2, 10), utc(), POINTS_PER_SOLVE);
    assert_eq!(next.solved_question_ids, vec!["q1".to_string()]);
    assert_eq!(next.total_solved, 1);
    assert_eq!(next.score, 20 + POINTS_PER_SOLVE);
  }

  #[test]
  fn same_question_twice_in_one_day_is_a_no_op() {
    let user = user_last_solved(None, 0);
    let first = apply_solve(&user, "q1", at(2024, 1, 1, 9), utc(), POINTS_PER_SOLVE);
    let mut again = first.clone();
    for hour in 10..20 {
      again = apply_solve(&again, "q1", at(2024, 1, 1, hour), utc(), POINTS_PER_SOLVE);
    }
    assert_eq!(again, first);
    assert_eq!(again.score, POINTS_PER_SOLVE);
    assert_eq!(again.last_solved_date, at(2024, 1, 1, 9).timestamp_millis());
  }

  #[test]
  fn same_question_on_a_later_day_still_counts() {
    let user = user_last_solved(None, 0);
    let first = apply_solve(&user, "q1", at(2024, 1, 1, 9), utc(), POINTS_PER_SOLVE);
    let next = apply_solve(&first, "q1", at(2024, 1, 2, 9), utc(), POINTS_PER_SOLVE);
    assert_eq!(next.current_streak, 2);
    assert_eq!(next.total_solved, 1);
    assert_eq!(next.score, 2 * POINTS_PER_SOLVE);
  }

  #[test]
  fn total_tracks_set_size_over_many_solves() {
    let mut user = user_last_solved(None, 0);
    let ids = ["a", "b", "a", "c", "b", "d", "a"];
    for (day, id) in ids.iter().enumerate() {
      user = apply_solve(&user, id, at(2024, 2, 1 + day as u32, 12), utc(), POINTS_PER_SOLVE);
      assert_eq!(user.total_solved as usize, user.solved_question_ids.len());
    }
    assert_eq!(user.total_solved, 4);
    assert_eq!(user.current_streak, 7);
    assert_eq!(user.score, 7 * POINTS_PER_SOLVE);
  }

  #[test]
  fn local_offset_decides_the_day() {
    // 23:30 UTC on Jan 1 is already Jan 2 in UTC+2.
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let user = user_last_solved(Some(at(2024, 1, 1, 8)), 3);
    let late = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
    assert_eq!(apply_solve(&user, "q", late, plus_two, POINTS_PER_SOLVE).current_streak, 4);
    assert_eq!(apply_solve(&user, "q", late, utc(), POINTS_PER_SOLVE).current_streak, 3);
  }

  #[test]
  fn weekly_strip_lights_streak_within_week() {
    // Wednesday 2024-01-03, streak of 5 only lights Mon..Wed.
    let user = user_last_solved(Some(at(2024, 1, 3, 7)), 5);
    let week = weekly_progress(&user, at(2024, 1, 3, 18), utc());
    assert_eq!(week, [true, true, true, false, false, false, false]);
  }

  #[test]
  fn weekly_strip_empty_when_not_solved_today() {
    let user = user_last_solved(Some(at(2024, 1, 2, 7)), 5);
    assert_eq!(weekly_progress(&user, at(2024, 1, 3, 18), utc()), [false; 7]);
  }
}
