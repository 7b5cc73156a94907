//! 学习进度的合并与汇总规则（纯函数）

use chrono::{DateTime, Utc};

use crate::models::courses::entities::{Enrollment, EnrollmentStatus};
use crate::models::progress::{
    entities::{CourseProgress, ProgressKey, ProgressStatus},
    requests::ProgressChanges,
};

/// 把百分比限制在 [0, 100]，非数值视为 0
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// 新进度行的默认值
pub fn new_progress(
    id: String,
    enrollment_id: &str,
    key: &ProgressKey,
    now: DateTime<Utc>,
) -> CourseProgress {
    CourseProgress {
        id,
        enrollment_id: enrollment_id.to_string(),
        course_id: key.course_id.clone(),
        user_id: key.user_id.clone(),
        module_id: key.module_id.clone(),
        lesson_id: key.lesson_id.clone(),
        quiz_id: key.quiz_id.clone(),
        assignment_id: key.assignment_id.clone(),
        progress_type: key.progress_type,
        status: ProgressStatus::NotStarted,
        completion_percentage: 0.0,
        time_spent_minutes: 0,
        started_at: None,
        completed_at: None,
        last_accessed_at: None,
        score: None,
        max_score: None,
        attempts: 0,
        max_attempts: None,
        is_mandatory: true,
        weight: 1.0,
        current_position: None,
        bookmarks: None,
        notes: None,
        difficulty_rating: None,
        feedback: None,
        created_at: now,
        updated_at: now,
    }
}

/// 切换状态并维护 started_at / completed_at
pub fn set_status(row: &mut CourseProgress, status: ProgressStatus, now: DateTime<Utc>) {
    if status != ProgressStatus::NotStarted && row.started_at.is_none() {
        row.started_at = Some(now);
    }
    if status == ProgressStatus::Completed && row.status != ProgressStatus::Completed {
        row.completed_at = Some(now);
    }
    row.status = status;
}

/// 设置完成百分比；达到 100 且未处于终态时自动完成
pub fn set_percentage(row: &mut CourseProgress, value: f64, now: DateTime<Utc>) {
    row.completion_percentage = clamp_percentage(value);
    if row.completion_percentage >= 100.0 && !row.status.is_terminal() {
        set_status(row, ProgressStatus::Completed, now);
    } else if row.completion_percentage > 0.0 && row.status == ProgressStatus::NotStarted {
        set_status(row, ProgressStatus::InProgress, now);
    }
}

/// 访问时间戳，每次写入都会刷新
pub fn touch(row: &mut CourseProgress, now: DateTime<Utc>) {
    row.last_accessed_at = Some(now);
    row.updated_at = now;
}

/// 把请求中提供的字段合并到进度行上
pub fn apply_changes(row: &mut CourseProgress, changes: ProgressChanges, now: DateTime<Utc>) {
    // 先设置显式状态，再由百分比决定是否自动完成
    if let Some(status) = changes.status {
        set_status(row, status, now);
    }
    if let Some(pct) = changes.completion_percentage {
        set_percentage(row, pct, now);
    }

    if changes.reset_time_spent {
        row.time_spent_minutes = 0;
    }
    if let Some(minutes) = changes.time_spent_minutes {
        row.time_spent_minutes = row.time_spent_minutes.saturating_add(minutes.max(0));
    }

    if let Some(score) = changes.score {
        row.score = Some(score);
    }
    if let Some(max_score) = changes.max_score {
        row.max_score = Some(max_score);
    }
    if let Some(attempts) = changes.attempts {
        row.attempts = attempts;
    }
    if let Some(max_attempts) = changes.max_attempts {
        row.max_attempts = Some(max_attempts);
    }
    if let Some(is_mandatory) = changes.is_mandatory {
        row.is_mandatory = is_mandatory;
    }
    if let Some(weight) = changes.weight {
        row.weight = weight;
    }
    if let Some(position) = changes.current_position {
        row.current_position = Some(position);
    }
    if let Some(bookmarks) = changes.bookmarks {
        row.bookmarks = Some(bookmarks);
    }
    if let Some(notes) = changes.notes {
        row.notes = Some(notes);
    }
    if let Some(rating) = changes.difficulty_rating {
        row.difficulty_rating = Some(rating);
    }
    if let Some(feedback) = changes.feedback {
        row.feedback = Some(feedback);
    }

    touch(row, now);
}

/// 课程完成度汇总结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rollup {
    pub completion_percentage: f64,
    pub mandatory_units: i64,
    pub completed_units: i64,
}

/// Σ(pct × weight × mandatory) / Σ(weight × mandatory)，分母为 0 时返回 0
pub fn weighted_completion(rows: &[CourseProgress]) -> Rollup {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut mandatory_units = 0;
    let mut completed_units = 0;

    for row in rows.iter().filter(|r| r.is_mandatory) {
        mandatory_units += 1;
        if row.status == ProgressStatus::Completed {
            completed_units += 1;
        }
        let weight = row.weight.max(0.0);
        numerator += clamp_percentage(row.completion_percentage) * weight;
        denominator += weight;
    }

    let completion_percentage = if denominator > 0.0 {
        // 保留两位小数
        ((numerator / denominator) * 100.0).round() / 100.0
    } else {
        0.0
    };

    Rollup {
        completion_percentage: clamp_percentage(completion_percentage),
        mandatory_units,
        completed_units,
    }
}

/// 由汇总完成度推出选课状态与完成时间
///
/// 达到 100 为 completed（保留首次完成时间），低于 100 恢复为 active 并清空完成时间；
/// 已退课的记录只更新百分比。
pub fn enrollment_state(
    enrollment: &Enrollment,
    percentage: f64,
    now: DateTime<Utc>,
) -> (EnrollmentStatus, Option<DateTime<Utc>>) {
    match enrollment.status {
        EnrollmentStatus::Dropped => (EnrollmentStatus::Dropped, enrollment.completed_at),
        _ if percentage >= 100.0 => (
            EnrollmentStatus::Completed,
            enrollment.completed_at.or(Some(now)),
        ),
        _ => (EnrollmentStatus::Active, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::progress::entities::ProgressType;
    use chrono::Duration;

    fn key() -> ProgressKey {
        ProgressKey {
            user_id: "u1".into(),
            course_id: "c1".into(),
            progress_type: ProgressType::Lesson,
            module_id: None,
            lesson_id: Some("l1".into()),
            quiz_id: None,
            assignment_id: None,
        }
    }

    fn row(pct: f64, weight: f64, mandatory: bool) -> CourseProgress {
        let mut row = new_progress("p".into(), "e1", &key(), Utc::now());
        row.completion_percentage = pct;
        row.weight = weight;
        row.is_mandatory = mandatory;
        row
    }

    #[test]
    fn test_new_progress_defaults() {
        let now = Utc::now();
        let row = new_progress("p1".into(), "e1", &key(), now);
        assert_eq!(row.status, ProgressStatus::NotStarted);
        assert_eq!(row.completion_percentage, 0.0);
        assert_eq!(row.time_spent_minutes, 0);
        assert_eq!(row.attempts, 0);
        assert!(row.is_mandatory);
        assert_eq!(row.weight, 1.0);
        assert_eq!(row.lesson_id.as_deref(), Some("l1"));
    }

    #[test]
    fn test_clamp_percentage() {
        assert_eq!(clamp_percentage(150.0), 100.0);
        assert_eq!(clamp_percentage(-3.0), 0.0);
        assert_eq!(clamp_percentage(f64::NAN), 0.0);
        assert_eq!(clamp_percentage(42.5), 42.5);
    }

    #[test]
    fn test_time_spent_accumulates_and_resets() {
        let now = Utc::now();
        let mut row = new_progress("p1".into(), "e1", &key(), now);

        apply_changes(
            &mut row,
            ProgressChanges {
                time_spent_minutes: Some(15),
                ..Default::default()
            },
            now,
        );
        apply_changes(
            &mut row,
            ProgressChanges {
                time_spent_minutes: Some(10),
                ..Default::default()
            },
            now,
        );
        assert_eq!(row.time_spent_minutes, 25);

        apply_changes(
            &mut row,
            ProgressChanges {
                reset_time_spent: true,
                time_spent_minutes: Some(5),
                ..Default::default()
            },
            now,
        );
        assert_eq!(row.time_spent_minutes, 5);
    }

    #[test]
    fn test_status_timestamps() {
        let t0 = Utc::now();
        let t1 = t0 + Duration::minutes(5);
        let mut row = new_progress("p1".into(), "e1", &key(), t0);

        apply_changes(
            &mut row,
            ProgressChanges {
                status: Some(ProgressStatus::InProgress),
                completion_percentage: Some(40.0),
                ..Default::default()
            },
            t0,
        );
        assert_eq!(row.started_at, Some(t0));
        assert!(row.completed_at.is_none());
        assert_eq!(row.last_accessed_at, Some(t0));

        apply_changes(
            &mut row,
            ProgressChanges {
                completion_percentage: Some(100.0),
                ..Default::default()
            },
            t1,
        );
        assert_eq!(row.status, ProgressStatus::Completed);
        assert_eq!(row.started_at, Some(t0));
        assert_eq!(row.completed_at, Some(t1));
        assert_eq!(row.updated_at, t1);
    }

    #[test]
    fn test_full_percentage_keeps_terminal_status() {
        let now = Utc::now();
        let mut row = new_progress("p1".into(), "e1", &key(), now);
        set_status(&mut row, ProgressStatus::Failed, now);
        set_percentage(&mut row, 120.0, now);
        assert_eq!(row.status, ProgressStatus::Failed);
        assert_eq!(row.completion_percentage, 100.0);
    }

    #[test]
    fn test_omitted_fields_keep_values() {
        let now = Utc::now();
        let mut row = new_progress("p1".into(), "e1", &key(), now);
        apply_changes(
            &mut row,
            ProgressChanges {
                notes: Some("ch.3".into()),
                difficulty_rating: Some(4),
                bookmarks: Some(vec!["00:42".into()]),
                ..Default::default()
            },
            now,
        );
        apply_changes(
            &mut row,
            ProgressChanges {
                current_position: Some(300),
                ..Default::default()
            },
            now,
        );
        assert_eq!(row.notes.as_deref(), Some("ch.3"));
        assert_eq!(row.difficulty_rating, Some(4));
        assert_eq!(row.bookmarks, Some(vec!["00:42".to_string()]));
        assert_eq!(row.current_position, Some(300));
    }

    #[test]
    fn test_weighted_completion() {
        let rows = vec![row(100.0, 1.0, true), row(50.0, 1.0, true), row(0.0, 1.0, false)];
        let rollup = weighted_completion(&rows);
        assert_eq!(rollup.completion_percentage, 75.0);
        assert_eq!(rollup.mandatory_units, 2);

        let weighted = vec![row(100.0, 3.0, true), row(0.0, 1.0, true)];
        assert_eq!(weighted_completion(&weighted).completion_percentage, 75.0);
    }

    #[test]
    fn test_weighted_completion_without_mandatory_weight() {
        assert_eq!(weighted_completion(&[]).completion_percentage, 0.0);
        let rows = vec![row(80.0, 1.0, false), row(100.0, 0.0, true)];
        assert_eq!(weighted_completion(&rows).completion_percentage, 0.0);
    }

    fn enrollment(status: EnrollmentStatus, completed_at: Option<DateTime<Utc>>) -> Enrollment {
        let now = Utc::now();
        Enrollment {
            id: "e1".into(),
            user_id: "u1".into(),
            course_id: "c1".into(),
            status,
            progress_percentage: 0.0,
            enrolled_at: now,
            completed_at,
            updated_at: now,
        }
    }

    #[test]
    fn test_enrollment_state_follows_rollup() {
        let now = Utc::now();
        let earlier = now - Duration::days(1);

        let active = enrollment(EnrollmentStatus::Active, None);
        assert_eq!(
            enrollment_state(&active, 100.0, now),
            (EnrollmentStatus::Completed, Some(now))
        );
        assert_eq!(
            enrollment_state(&active, 99.99, now),
            (EnrollmentStatus::Active, None)
        );

        let completed = enrollment(EnrollmentStatus::Completed, Some(earlier));
        assert_eq!(
            enrollment_state(&completed, 100.0, now),
            (EnrollmentStatus::Completed, Some(earlier))
        );
        // 新增未完成的必修单元后回到进行中
        assert_eq!(
            enrollment_state(&completed, 50.0, now),
            (EnrollmentStatus::Active, None)
        );

        let dropped = enrollment(EnrollmentStatus::Dropped, None);
        assert_eq!(
            enrollment_state(&dropped, 100.0, now).0,
            EnrollmentStatus::Dropped
        );
    }
}
