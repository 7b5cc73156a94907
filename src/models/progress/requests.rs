use serde::Deserialize;
use ts_rs::TS;

use crate::models::progress::entities::{ProgressKey, ProgressStatus, ProgressType};
use crate::models::{FieldError, FieldErrors};
use crate::utils::validate::validate_id;

/// 可合并到进度行上的字段（未提供的字段保持原值）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/progress.ts")]
pub struct ProgressChanges {
    pub status: Option<ProgressStatus>,
    pub completion_percentage: Option<f64>,
    /// 本次新增的学习时长（分钟），累加到已有时长
    pub time_spent_minutes: Option<i64>,
    /// 为 true 时先清零已有时长
    #[serde(default)]
    pub reset_time_spent: bool,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub attempts: Option<i32>,
    pub max_attempts: Option<i32>,
    pub is_mandatory: Option<bool>,
    pub weight: Option<f64>,
    pub current_position: Option<i32>,
    pub bookmarks: Option<Vec<String>>,
    pub notes: Option<String>,
    pub difficulty_rating: Option<i32>,
    pub feedback: Option<String>,
}

impl ProgressChanges {
    fn check(&self, errors: &mut FieldErrors) {
        if let Some(pct) = self.completion_percentage {
            errors.check(
                pct.is_finite(),
                "completion_percentage",
                "completion_percentage must be a number",
            );
        }
        if let Some(minutes) = self.time_spent_minutes {
            errors.check(
                minutes >= 0,
                "time_spent_minutes",
                "time_spent_minutes must not be negative",
            );
        }
        for (field, value) in [("score", self.score), ("max_score", self.max_score)] {
            if let Some(v) = value {
                errors.check(
                    v.is_finite() && v >= 0.0,
                    field,
                    format!("{field} must be a non-negative number"),
                );
            }
        }
        if let Some(attempts) = self.attempts {
            errors.check(attempts >= 0, "attempts", "attempts must not be negative");
        }
        if let Some(max_attempts) = self.max_attempts {
            errors.check(
                max_attempts >= 1,
                "max_attempts",
                "max_attempts must be at least 1",
            );
        }
        if let Some(weight) = self.weight {
            errors.check(
                weight.is_finite() && weight >= 0.0,
                "weight",
                "weight must be a non-negative number",
            );
        }
        if let Some(position) = self.current_position {
            errors.check(
                position >= 0,
                "current_position",
                "current_position must not be negative",
            );
        }
        if let Some(rating) = self.difficulty_rating {
            errors.check(
                (1..=5).contains(&rating),
                "difficulty_rating",
                "difficulty_rating must be between 1 and 5",
            );
        }
    }
}

/// 记录进度请求（按自然键新增或合并）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/progress.ts")]
pub struct RecordProgressRequest {
    pub enrollment_id: String,
    pub course_id: String,
    pub progress_type: ProgressType,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub quiz_id: Option<String>,
    pub assignment_id: Option<String>,
    #[serde(flatten)]
    #[ts(flatten)]
    pub changes: ProgressChanges,
}

/// 单课时进度请求（lesson_id 来自路径）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/progress.ts")]
pub struct LessonProgressRequest {
    pub enrollment_id: String,
    pub course_id: String,
    pub module_id: Option<String>,
    #[serde(flatten)]
    #[ts(flatten)]
    pub changes: ProgressChanges,
}

impl LessonProgressRequest {
    pub fn into_record(self, lesson_id: String) -> RecordProgressRequest {
        RecordProgressRequest {
            enrollment_id: self.enrollment_id,
            course_id: self.course_id,
            progress_type: ProgressType::Lesson,
            module_id: self.module_id,
            lesson_id: Some(lesson_id),
            quiz_id: None,
            assignment_id: None,
            changes: self.changes,
        }
    }
}

/// 校验后的进度命令
#[derive(Debug, Clone)]
pub struct RecordProgressCommand {
    pub enrollment_id: String,
    pub key: ProgressKey,
    pub changes: ProgressChanges,
}

impl RecordProgressRequest {
    /// user_id 来自认证上下文，不由请求体提供
    pub fn validate(self, user_id: &str) -> Result<RecordProgressCommand, Vec<FieldError>> {
        let mut errors = FieldErrors::new();

        for (field, value) in [
            ("enrollment_id", Some(&self.enrollment_id)),
            ("course_id", Some(&self.course_id)),
            ("module_id", self.module_id.as_ref()),
            ("lesson_id", self.lesson_id.as_ref()),
            ("quiz_id", self.quiz_id.as_ref()),
            ("assignment_id", self.assignment_id.as_ref()),
        ] {
            if let Some(Err(msg)) = value.map(|v| validate_id(v)) {
                errors.push(field, msg);
            }
        }

        // 每种进度类型必须携带对应的单元 ID
        let required = match self.progress_type {
            ProgressType::Lesson => Some(("lesson_id", self.lesson_id.is_some())),
            ProgressType::Quiz => Some(("quiz_id", self.quiz_id.is_some())),
            ProgressType::Assignment => Some(("assignment_id", self.assignment_id.is_some())),
            ProgressType::Module => Some(("module_id", self.module_id.is_some())),
            ProgressType::Course => None,
        };
        if let Some((field, present)) = required {
            errors.check(
                present,
                field,
                format!("{field} is required for {} progress", self.progress_type),
            );
        }

        self.changes.check(&mut errors);

        errors.finish(RecordProgressCommand {
            enrollment_id: self.enrollment_id,
            key: ProgressKey {
                user_id: user_id.to_string(),
                course_id: self.course_id,
                progress_type: self.progress_type,
                module_id: self.module_id,
                lesson_id: self.lesson_id,
                quiz_id: self.quiz_id,
                assignment_id: self.assignment_id,
            },
            changes: self.changes,
        })
    }
}

/// 更新完成百分比
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/progress.ts")]
pub struct UpdateProgressPercentageRequest {
    pub completion_percentage: f64,
}

/// 更新进度状态
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/progress.ts")]
pub struct UpdateProgressStatusRequest {
    pub status: ProgressStatus,
}

/// 进度列表查询参数（各过滤条件可组合）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/progress.ts")]
pub struct ProgressListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub enrollment_id: Option<String>,
    pub course_id: Option<String>,
    pub user_id: Option<String>,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub quiz_id: Option<String>,
    pub assignment_id: Option<String>,
    pub status: Option<ProgressStatus>,
    pub progress_type: Option<ProgressType>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson_request() -> RecordProgressRequest {
        RecordProgressRequest {
            enrollment_id: "e1".into(),
            course_id: "c1".into(),
            progress_type: ProgressType::Lesson,
            module_id: None,
            lesson_id: Some("l1".into()),
            quiz_id: None,
            assignment_id: None,
            changes: ProgressChanges::default(),
        }
    }

    #[test]
    fn test_lesson_progress_requires_lesson_id() {
        let mut req = lesson_request();
        req.lesson_id = None;
        let errors = req.validate("u1").unwrap_err();
        assert_eq!(errors[0].field, "lesson_id");
    }

    #[test]
    fn test_course_progress_needs_no_unit_id() {
        let mut req = lesson_request();
        req.progress_type = ProgressType::Course;
        req.lesson_id = None;
        let command = req.validate("u1").unwrap();
        assert_eq!(command.key.encode(), "u1|c1|course||||");
    }

    #[test]
    fn test_rating_out_of_range() {
        let mut req = lesson_request();
        req.changes.difficulty_rating = Some(6);
        req.changes.time_spent_minutes = Some(-5);
        let errors = req.validate("u1").unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["time_spent_minutes", "difficulty_rating"]);
    }

    #[test]
    fn test_flattened_body() {
        let req: LessonProgressRequest = serde_json::from_str(
            r#"{"enrollment_id":"e1","course_id":"c1","status":"in_progress","completion_percentage":40}"#,
        )
        .unwrap();
        let command = req.into_record("l1".into()).validate("u1").unwrap();
        assert_eq!(command.key.lesson_id.as_deref(), Some("l1"));
        assert_eq!(command.changes.status, Some(ProgressStatus::InProgress));
        assert_eq!(command.changes.completion_percentage, Some(40.0));
        assert!(!command.changes.reset_time_spent);
    }
}
