use std::collections::HashMap;

use serde::Deserialize;
use ts_rs::TS;

use crate::models::submissions::entities::SubmissionStatus;
use crate::models::{FieldError, FieldErrors};
use crate::utils::validate::{validate_file_url, validate_id};

/// 提交作业请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct CreateSubmissionRequest {
    pub assignment_id: String,
    /// 可选，若提供必须与作业所属课程一致
    pub course_id: Option<String>,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub submission_text: Option<String>,
    #[serde(default)]
    pub file_urls: Vec<String>,
}

/// 校验后的提交命令
#[derive(Debug, Clone)]
pub struct SubmitCommand {
    pub assignment_id: String,
    pub course_id: Option<String>,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub submission_text: Option<String>,
    pub file_urls: Vec<String>,
}

impl CreateSubmissionRequest {
    pub fn validate(self) -> Result<SubmitCommand, Vec<FieldError>> {
        let mut errors = FieldErrors::new();

        if let Err(msg) = validate_id(&self.assignment_id) {
            errors.push("assignment_id", msg);
        }
        for (field, value) in [
            ("course_id", &self.course_id),
            ("module_id", &self.module_id),
            ("lesson_id", &self.lesson_id),
        ] {
            if let Some(Err(msg)) = value.as_deref().map(validate_id) {
                errors.push(field, msg);
            }
        }

        // 空白文本视为未提供
        let submission_text = self
            .submission_text
            .filter(|text| !text.trim().is_empty());

        errors.check(
            submission_text.is_some() || !self.file_urls.is_empty(),
            "submission_text",
            "submission_text or file_urls is required",
        );
        for (index, url) in self.file_urls.iter().enumerate() {
            if let Err(msg) = validate_file_url(url) {
                errors.push(&format!("file_urls[{index}]"), msg);
            }
        }

        errors.finish(SubmitCommand {
            assignment_id: self.assignment_id,
            course_id: self.course_id,
            module_id: self.module_id,
            lesson_id: self.lesson_id,
            submission_text,
            file_urls: self.file_urls,
        })
    }
}

/// 评分请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct GradeSubmissionRequest {
    pub id: String,
    pub score: f64,
    pub instructor_feedback: Option<String>,
    pub rubric_scores: Option<HashMap<String, f64>>,
}

/// PUT /assignment-submissions 的请求体，按 action 区分操作
#[derive(Debug, Clone, Deserialize, TS)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub enum UpdateSubmissionRequest {
    Grade(GradeSubmissionRequest),
}

/// 校验后的评分命令
#[derive(Debug, Clone)]
pub struct GradeCommand {
    pub score: f64,
    pub instructor_feedback: Option<String>,
    pub rubric_scores: Option<HashMap<String, f64>>,
}

impl GradeSubmissionRequest {
    /// 返回 (提交 ID, 评分命令)
    pub fn validate(self) -> Result<(String, GradeCommand), Vec<FieldError>> {
        let mut errors = FieldErrors::new();

        if let Err(msg) = validate_id(&self.id) {
            errors.push("id", msg);
        }
        errors.check(
            self.score.is_finite() && self.score >= 0.0,
            "score",
            "score must be a non-negative number",
        );
        if let Some(rubric) = &self.rubric_scores {
            for (criterion, score) in rubric {
                errors.check(
                    !criterion.trim().is_empty(),
                    "rubric_scores",
                    "criterion name must not be empty",
                );
                errors.check(
                    score.is_finite() && *score >= 0.0,
                    "rubric_scores",
                    format!("score for '{criterion}' must be a non-negative number"),
                );
            }
        }

        errors.finish((
            self.id,
            GradeCommand {
                score: self.score,
                instructor_feedback: self
                    .instructor_feedback
                    .filter(|text| !text.trim().is_empty()),
                rubric_scores: self.rubric_scores,
            },
        ))
    }
}

/// 提交列表查询参数（各过滤条件可组合）
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionListQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub user_id: Option<String>,
    pub course_id: Option<String>,
    pub assignment_id: Option<String>,
    pub status: Option<SubmissionStatus>,
    pub graded_by: Option<String>,
}
