use chrono::{DateTime, Utc};
use serde::Deserialize;
use ts_rs::TS;

use crate::models::{FieldError, FieldErrors};
use crate::utils::validate::validate_id;

const DEFAULT_MAX_SCORE: f64 = 100.0;
const DEFAULT_PASSING_RATIO: f64 = 0.6;

/// 创建课程请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CreateCourseRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
}

impl CreateCourseRequest {
    pub fn validate(self, created_by: &str) -> Result<NewCourse, Vec<FieldError>> {
        let mut errors = FieldErrors::new();
        let title = self.title.trim().to_string();
        errors.check(!title.is_empty(), "title", "title is required");
        errors.check(
            title.chars().count() <= 200,
            "title",
            "title must be at most 200 characters",
        );

        errors.finish(NewCourse {
            title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            created_by: created_by.to_string(),
        })
    }
}

/// 创建作业请求（course_id 来自路径）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct CreateAssignmentRequest {
    pub title: String,
    pub description: Option<String>,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub max_score: Option<f64>,
    /// 缺省为满分的 60%
    pub passing_score: Option<f64>,
    pub due_date: Option<DateTime<Utc>>,
    pub allow_late_submission: Option<bool>,
    pub late_penalty_percent: Option<f64>,
    pub max_attempts: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub course_id: String,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub max_score: f64,
    pub passing_score: f64,
    pub due_date: Option<DateTime<Utc>>,
    pub allow_late_submission: bool,
    pub late_penalty_percent: f64,
    pub max_attempts: Option<i32>,
    pub created_by: String,
}

impl CreateAssignmentRequest {
    pub fn validate(
        self,
        course_id: &str,
        created_by: &str,
    ) -> Result<NewAssignment, Vec<FieldError>> {
        let mut errors = FieldErrors::new();

        let title = self.title.trim().to_string();
        errors.check(!title.is_empty(), "title", "title is required");
        for (field, value) in [("module_id", &self.module_id), ("lesson_id", &self.lesson_id)] {
            if let Some(Err(msg)) = value.as_deref().map(validate_id) {
                errors.push(field, msg);
            }
        }

        let max_score = self.max_score.unwrap_or(DEFAULT_MAX_SCORE);
        errors.check(
            max_score.is_finite() && max_score > 0.0,
            "max_score",
            "max_score must be greater than 0",
        );
        let passing_score = self
            .passing_score
            .unwrap_or(max_score * DEFAULT_PASSING_RATIO);
        errors.check(
            passing_score.is_finite() && (0.0..=max_score).contains(&passing_score),
            "passing_score",
            "passing_score must be between 0 and max_score",
        );
        let late_penalty_percent = self.late_penalty_percent.unwrap_or(0.0);
        errors.check(
            (0.0..=100.0).contains(&late_penalty_percent),
            "late_penalty_percent",
            "late_penalty_percent must be between 0 and 100",
        );
        if let Some(max_attempts) = self.max_attempts {
            errors.check(
                max_attempts >= 1,
                "max_attempts",
                "max_attempts must be at least 1",
            );
        }

        errors.finish(NewAssignment {
            course_id: course_id.to_string(),
            module_id: self.module_id,
            lesson_id: self.lesson_id,
            title,
            description: self.description.filter(|d| !d.trim().is_empty()),
            max_score,
            passing_score,
            due_date: self.due_date,
            allow_late_submission: self.allow_late_submission.unwrap_or(true),
            late_penalty_percent,
            max_attempts: self.max_attempts,
            created_by: created_by.to_string(),
        })
    }
}

/// 选课列表查询参数
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct EnrollmentListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub user_id: Option<String>,
    pub course_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment_request() -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            title: "Essay".into(),
            description: None,
            module_id: None,
            lesson_id: None,
            max_score: None,
            passing_score: None,
            due_date: None,
            allow_late_submission: None,
            late_penalty_percent: None,
            max_attempts: None,
        }
    }

    #[test]
    fn test_assignment_defaults() {
        let new = assignment_request().validate("c1", "t1").unwrap();
        assert_eq!(new.max_score, 100.0);
        assert_eq!(new.passing_score, 60.0);
        assert!(new.allow_late_submission);
        assert_eq!(new.late_penalty_percent, 0.0);
        assert_eq!(new.course_id, "c1");
    }

    #[test]
    fn test_passing_score_follows_max_score() {
        let mut req = assignment_request();
        req.max_score = Some(50.0);
        let new = req.validate("c1", "t1").unwrap();
        assert_eq!(new.passing_score, 30.0);
    }

    #[test]
    fn test_assignment_rejects_bad_limits() {
        let mut req = assignment_request();
        req.passing_score = Some(120.0);
        req.late_penalty_percent = Some(150.0);
        req.max_attempts = Some(0);
        let errors = req.validate("c1", "t1").unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["passing_score", "late_penalty_percent", "max_attempts"]
        );
    }

    #[test]
    fn test_course_title_required() {
        let req = CreateCourseRequest {
            title: "  ".into(),
            description: None,
        };
        assert_eq!(req.validate("t1").unwrap_err()[0].field, "title");
    }
}
