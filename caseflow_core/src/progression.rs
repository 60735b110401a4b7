//! Rehabilitation day progression.
//!
//! Computes the daily progress grid for a plan: per-day status, the current
//! day pointer, completed-day count and overall percentage. A fully completed
//! day does not roll over to the next one until the configured wall-clock
//! hour (06:00 by default) on the following calendar day, so a worker who
//! finishes late at night does not immediately see "tomorrow" as current.
//!
//! Pure over its inputs: the caller threads `now` in explicitly.

use crate::calendar;
use crate::types::{Completion, CompletionMap, RehabilitationPlan};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use uuid::Uuid;

/// Default rollover hour (06:00 the next calendar day)
pub const DEFAULT_ROLLOVER_HOUR: u32 = 6;

/// Display status of one plan day
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DayStatus {
    Completed,
    Current,
    Pending,
}

/// Progress for a single plan day
#[derive(Clone, Debug)]
pub struct DayProgress {
    pub day_number: u32,
    pub date: NaiveDate,
    pub status: DayStatus,
    pub fully_completed: bool,
    pub completed_count: usize,
}

/// Progress for a whole plan
#[derive(Clone, Debug)]
pub struct PlanProgress {
    pub days: Vec<DayProgress>,
    pub current_day: u32,
    pub days_completed: u32,
    pub progress_percent: u32,
}

/// Collapse completion records for one plan into per-day exercise-id sets
///
/// Duplicate `(exercise, date)` marks collapse into the set, keeping
/// completions idempotent rather than additive.
pub fn build_completion_map(records: &[Completion], plan_id: Uuid) -> CompletionMap {
    let mut map = CompletionMap::new();
    for record in records.iter().filter(|c| c.plan_id == plan_id) {
        map.entry(record.date)
            .or_insert_with(HashSet::new)
            .insert(record.exercise_id.clone());
    }
    map
}

/// Compute the daily progress grid for a plan
///
/// Forward pass, walking days from the plan start:
/// - A day after today halts progression; it and all later days are pending.
/// - A plan with no exercises resolves at the first non-future day (there is
///   nothing to judge completion against).
/// - A fully completed day counts toward `days_completed`. On the last plan
///   day progression stops there; otherwise the current-day pointer advances
///   only once `now` has passed the rollover instant for that day.
/// - An incomplete day that is today or earlier is where progression holds.
///
/// A second pass settles the displayed statuses around the final current-day
/// pointer; a fully completed day the pointer still sits on (gate not yet
/// passed) keeps its completed status.
pub fn compute_progress(
    plan: &RehabilitationPlan,
    completions: &CompletionMap,
    now: DateTime<Utc>,
    rollover_hour: u32,
) -> PlanProgress {
    let today = calendar::normalize_to_day(now);
    let total_days = plan.total_days();

    let mut days: Vec<DayProgress> = Vec::with_capacity(total_days as usize);
    let mut current_day: i64 = 1;
    let mut days_completed: i64 = 0;
    let mut halted = false;

    for offset in 0..total_days {
        let date = calendar::add_days(plan.start_date, offset);
        let day_number = offset + 1;

        let completed_set = completions.get(&date);
        let completed_count = completed_set.map_or(0, |set| {
            plan.exercises.iter().filter(|e| set.contains(&e.id)).count()
        });
        let fully_completed =
            !plan.exercises.is_empty() && completed_count == plan.exercises.len();

        let mut push = |status: DayStatus| {
            days.push(DayProgress {
                day_number: day_number as u32,
                date,
                status,
                fully_completed,
                completed_count,
            });
        };

        if halted {
            push(DayStatus::Pending);
            continue;
        }

        if date > today {
            current_day = day_number;
            halted = true;
            push(DayStatus::Pending);
            continue;
        }

        if plan.exercises.is_empty() {
            current_day = day_number;
            halted = true;
            push(DayStatus::Current);
            continue;
        }

        if fully_completed {
            days_completed += 1;
            push(DayStatus::Completed);
            if offset == total_days - 1 {
                current_day = total_days;
                halted = true;
            } else if now >= calendar::rollover_instant(date, rollover_hour) {
                current_day = day_number + 1;
            } else {
                // Day is complete but the rollover gate has not passed yet
                current_day = day_number;
                halted = true;
            }
            continue;
        }

        current_day = day_number;
        halted = true;
        push(DayStatus::Current);
    }

    let current_day = current_day.clamp(1, total_days);

    for day in &mut days {
        let n = i64::from(day.day_number);
        if n == current_day && !day.fully_completed {
            day.status = DayStatus::Current;
        } else if n > current_day {
            day.status = DayStatus::Pending;
        } else if day.fully_completed && n < current_day {
            day.status = DayStatus::Completed;
        }
    }

    let progress_percent = ((days_completed as f64) * 100.0 / (total_days as f64)).round() as u32;

    PlanProgress {
        days,
        current_day: current_day as u32,
        days_completed: days_completed as u32,
        progress_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exercise;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn three_day_plan() -> RehabilitationPlan {
        RehabilitationPlan::new(
            Uuid::new_v4(),
            day(2024, 1, 1),
            day(2024, 1, 3),
            vec![
                Exercise { id: "a".into(), order: 1 },
                Exercise { id: "b".into(), order: 2 },
            ],
        )
        .unwrap()
    }

    fn completions_for(plan: &RehabilitationPlan, days: &[NaiveDate]) -> CompletionMap {
        let mut records = Vec::new();
        for date in days {
            for exercise in &plan.exercises {
                records.push(Completion {
                    plan_id: plan.id,
                    exercise_id: exercise.id.clone(),
                    date: *date,
                });
            }
        }
        build_completion_map(&records, plan.id)
    }

    #[test]
    fn test_day_one_complete_before_gate_holds() {
        let plan = three_day_plan();
        let completions = completions_for(&plan, &[day(2024, 1, 1)]);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 5, 0, 0).unwrap();

        let progress = compute_progress(&plan, &completions, now, DEFAULT_ROLLOVER_HOUR);
        assert_eq!(progress.current_day, 1);
        assert_eq!(progress.days_completed, 1);
        assert_eq!(progress.progress_percent, 33);
        assert_eq!(progress.days[0].status, DayStatus::Completed);
        assert_eq!(progress.days[1].status, DayStatus::Pending);
        assert_eq!(progress.days[2].status, DayStatus::Pending);
    }

    #[test]
    fn test_day_one_complete_after_gate_advances() {
        let plan = three_day_plan();
        let completions = completions_for(&plan, &[day(2024, 1, 1)]);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 7, 0, 0).unwrap();

        let progress = compute_progress(&plan, &completions, now, DEFAULT_ROLLOVER_HOUR);
        assert_eq!(progress.current_day, 2);
        assert_eq!(progress.days_completed, 1);
        assert_eq!(progress.progress_percent, 33);
        assert_eq!(progress.days[0].status, DayStatus::Completed);
        assert_eq!(progress.days[1].status, DayStatus::Current);
        assert_eq!(progress.days[2].status, DayStatus::Pending);
    }

    #[test]
    fn test_all_days_complete() {
        let plan = three_day_plan();
        let completions =
            completions_for(&plan, &[day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3)]);
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap();

        let progress = compute_progress(&plan, &completions, now, DEFAULT_ROLLOVER_HOUR);
        assert_eq!(progress.current_day, 3);
        assert_eq!(progress.days_completed, 3);
        assert_eq!(progress.progress_percent, 100);
        assert!(progress
            .days
            .iter()
            .all(|d| d.status == DayStatus::Completed));
    }

    #[test]
    fn test_last_day_complete_stops_without_gate() {
        // Completing the final day pins the pointer to it regardless of time
        let plan = three_day_plan();
        let completions =
            completions_for(&plan, &[day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 3)]);
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 23, 0, 0).unwrap();

        let progress = compute_progress(&plan, &completions, now, DEFAULT_ROLLOVER_HOUR);
        assert_eq!(progress.current_day, 3);
        assert_eq!(progress.days_completed, 3);
    }

    #[test]
    fn test_incomplete_day_holds_progression() {
        let plan = three_day_plan();
        // Only one of two exercises done on day 1
        let records = vec![Completion {
            plan_id: plan.id,
            exercise_id: "a".into(),
            date: day(2024, 1, 1),
        }];
        let completions = build_completion_map(&records, plan.id);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();

        let progress = compute_progress(&plan, &completions, now, DEFAULT_ROLLOVER_HOUR);
        assert_eq!(progress.current_day, 1);
        assert_eq!(progress.days_completed, 0);
        assert_eq!(progress.progress_percent, 0);
        assert_eq!(progress.days[0].status, DayStatus::Current);
        assert_eq!(progress.days[0].completed_count, 1);
    }

    #[test]
    fn test_plan_entirely_in_future() {
        let plan = three_day_plan();
        let now = Utc.with_ymd_and_hms(2023, 12, 20, 12, 0, 0).unwrap();

        let progress = compute_progress(&plan, &CompletionMap::new(), now, DEFAULT_ROLLOVER_HOUR);
        assert_eq!(progress.current_day, 1);
        assert_eq!(progress.days_completed, 0);
        // The first upcoming day is shown as current, the rest pending
        assert_eq!(progress.days[0].status, DayStatus::Current);
        assert_eq!(progress.days[1].status, DayStatus::Pending);
    }

    #[test]
    fn test_empty_exercise_list_resolves_first_day() {
        let plan = RehabilitationPlan::new(
            Uuid::new_v4(),
            day(2024, 1, 1),
            day(2024, 1, 3),
            vec![],
        )
        .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();

        let progress = compute_progress(&plan, &CompletionMap::new(), now, DEFAULT_ROLLOVER_HOUR);
        assert_eq!(progress.current_day, 1);
        assert_eq!(progress.days_completed, 0);
        assert_eq!(progress.progress_percent, 0);
    }

    #[test]
    fn test_single_day_plan() {
        let plan = RehabilitationPlan::new(
            Uuid::new_v4(),
            day(2024, 1, 1),
            day(2024, 1, 1),
            vec![Exercise { id: "a".into(), order: 1 }],
        )
        .unwrap();
        let records = vec![Completion {
            plan_id: plan.id,
            exercise_id: "a".into(),
            date: day(2024, 1, 1),
        }];
        let completions = build_completion_map(&records, plan.id);
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap();

        let progress = compute_progress(&plan, &completions, now, DEFAULT_ROLLOVER_HOUR);
        assert_eq!(progress.current_day, 1);
        assert_eq!(progress.days_completed, 1);
        assert_eq!(progress.progress_percent, 100);
    }

    #[test]
    fn test_completion_map_idempotent_and_scoped() {
        let plan_id = Uuid::new_v4();
        let other_plan = Uuid::new_v4();
        let records = vec![
            Completion { plan_id, exercise_id: "a".into(), date: day(2024, 1, 1) },
            Completion { plan_id, exercise_id: "a".into(), date: day(2024, 1, 1) },
            Completion { plan_id: other_plan, exercise_id: "b".into(), date: day(2024, 1, 1) },
        ];
        let map = build_completion_map(&records, plan_id);
        assert_eq!(map[&day(2024, 1, 1)].len(), 1);
    }

    #[test]
    fn test_completions_for_unknown_exercise_do_not_count() {
        let plan = three_day_plan();
        let records = vec![
            Completion { plan_id: plan.id, exercise_id: "a".into(), date: day(2024, 1, 1) },
            Completion { plan_id: plan.id, exercise_id: "zz".into(), date: day(2024, 1, 1) },
        ];
        let completions = build_completion_map(&records, plan.id);
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();

        let progress = compute_progress(&plan, &completions, now, DEFAULT_ROLLOVER_HOUR);
        assert_eq!(progress.days_completed, 0);
        assert_eq!(progress.days[0].completed_count, 1);
    }

    #[test]
    fn test_progress_rounding() {
        // 2 of 3 days complete rounds to 67
        let plan = three_day_plan();
        let completions = completions_for(&plan, &[day(2024, 1, 1), day(2024, 1, 2)]);
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();

        let progress = compute_progress(&plan, &completions, now, DEFAULT_ROLLOVER_HOUR);
        assert_eq!(progress.days_completed, 2);
        assert_eq!(progress.progress_percent, 67);
        assert_eq!(progress.current_day, 3);
    }
}
