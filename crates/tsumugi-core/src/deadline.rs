//! Deadline Calculator - 締切と緊急度の純関数
//!
//! 副作用なし。失敗するのはオフセット加算で日付が表現範囲を超えたときだけで、
//! その場合は Validation エラーを返します。
//!
//! # 緊急度スコア
//! `urgency_score` は `days_until_due` に対して単調増加（より過ぎている ⇒
//! より小さいスコア ⇒ 先頭にソート）。同じ残日数のときは task_type の
//! 優先順位（shipping, clothing_order, standard_clothing_order, paper_order,
//! cd_master, cd_production）で決まります。

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{TaskStatus, TaskType, TsumugiError};

/// Compute a task deadline: event date + signed day offset.
pub fn compute_deadline(
    event_date: NaiveDate,
    timeline_offset: i32,
) -> Result<NaiveDate, TsumugiError> {
    event_date
        .checked_add_signed(Duration::days(timeline_offset as i64))
        .ok_or_else(|| {
            TsumugiError::validation(format!(
                "deadline out of range: {event_date} {timeline_offset:+}d"
            ))
        })
}

/// Urgency of a single task at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Urgency {
    /// floor(deadline - now, in days). 締切当日は 0、過ぎていれば負。
    pub days_until_due: i64,

    /// pending かつ残日数が負のときだけ true。
    pub is_overdue: bool,

    /// Sort key: lower sorts first.
    pub urgency_score: i64,
}

/// Compute urgency for a task.
pub fn compute_urgency(
    deadline: NaiveDate,
    now: DateTime<Utc>,
    status: TaskStatus,
    task_type: TaskType,
) -> Urgency {
    let days_until_due = (deadline - now.date_naive()).num_days();
    let is_overdue = status == TaskStatus::Pending && days_until_due < 0;

    // 残日数で主ソート、同点は type 優先度で決める。
    // priority は 0..=5 なので、日数 1 日分より常に小さい。
    let urgency_score = days_until_due * 10 + task_type.priority();

    Urgency {
        days_until_due,
        is_overdue,
        urgency_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    #[rstest]
    #[case(-14, date(2026, 5, 1))]
    #[case(0, date(2026, 5, 15))]
    #[case(3, date(2026, 5, 18))]
    fn deadline_is_event_date_plus_offset(#[case] offset: i32, #[case] expected: NaiveDate) {
        let deadline = compute_deadline(date(2026, 5, 15), offset).unwrap();
        assert_eq!(deadline, expected);
    }

    #[test]
    fn deadline_overflow_is_a_validation_error() {
        let err = compute_deadline(NaiveDate::MAX, 1).unwrap_err();
        assert!(matches!(err, TsumugiError::Validation(_)));
    }

    #[test]
    fn days_until_due_is_floor_of_day_difference() {
        let now = at(2026, 5, 10);
        let due_today =
            compute_urgency(date(2026, 5, 10), now, TaskStatus::Pending, TaskType::PaperOrder);
        assert_eq!(due_today.days_until_due, 0);
        assert!(!due_today.is_overdue);

        let overdue =
            compute_urgency(date(2026, 5, 8), now, TaskStatus::Pending, TaskType::PaperOrder);
        assert_eq!(overdue.days_until_due, -2);
        assert!(overdue.is_overdue);
    }

    #[test]
    fn urgency_is_monotonic_in_days_until_due() {
        let now = at(2026, 5, 10);
        let mut prev: Option<i64> = None;
        for day in 1..=20 {
            let u = compute_urgency(
                date(2026, 5, day),
                now,
                TaskStatus::Pending,
                TaskType::ClothingOrder,
            );
            if let Some(p) = prev {
                assert!(u.urgency_score > p, "score must grow with the deadline");
            }
            prev = Some(u.urgency_score);
        }
    }

    #[test]
    fn ties_break_by_task_type_priority() {
        let now = at(2026, 5, 10);
        let deadline = date(2026, 5, 12);
        let shipping =
            compute_urgency(deadline, now, TaskStatus::Pending, TaskType::Shipping);
        let clothing =
            compute_urgency(deadline, now, TaskStatus::Pending, TaskType::ClothingOrder);
        let cd = compute_urgency(deadline, now, TaskStatus::Pending, TaskType::CdProduction);

        assert!(shipping.urgency_score < clothing.urgency_score);
        assert!(clothing.urgency_score < cd.urgency_score);
    }

    #[rstest]
    #[case::completed(TaskStatus::Completed)]
    #[case::cancelled(TaskStatus::Cancelled)]
    fn only_pending_tasks_are_overdue(#[case] status: TaskStatus) {
        let u = compute_urgency(date(2026, 5, 1), at(2026, 5, 10), status, TaskType::Shipping);
        assert!(u.days_until_due < 0);
        assert!(!u.is_overdue);
    }
}
