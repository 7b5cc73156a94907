//! 作业提交实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignment_submissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub assignment_id: String,
    pub course_id: String,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub submission_text: Option<String>,
    /// JSON 数组
    #[sea_orm(column_type = "Text")]
    pub file_urls: String,
    pub score: Option<f64>,
    pub max_score: f64,
    pub attempt_number: i32,
    pub is_passed: bool,
    pub is_late: bool,
    pub late_penalty_applied: Option<f64>,
    pub submitted_at: i64,
    pub graded_at: Option<i64>,
    pub graded_by: Option<String>,
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub instructor_feedback: Option<String>,
    /// JSON 对象 criterion -> score
    #[sea_orm(column_type = "Text", nullable)]
    pub rubric_scores: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::assignments::Column::Id"
    )]
    Assignment,
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id"
    )]
    Course,
}

impl Related<super::assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_submission(self) -> crate::models::submissions::entities::AssignmentSubmission {
        use crate::models::submissions::entities::{AssignmentSubmission, SubmissionStatus};

        AssignmentSubmission {
            id: self.id,
            user_id: self.user_id,
            assignment_id: self.assignment_id,
            course_id: self.course_id,
            module_id: self.module_id,
            lesson_id: self.lesson_id,
            submission_text: self.submission_text,
            file_urls: serde_json::from_str(&self.file_urls).unwrap_or_default(),
            score: self.score,
            max_score: self.max_score,
            attempt_number: self.attempt_number,
            is_passed: self.is_passed,
            is_late: self.is_late,
            late_penalty_applied: self.late_penalty_applied,
            submitted_at: super::from_ts(self.submitted_at),
            graded_at: self.graded_at.map(super::from_ts),
            graded_by: self.graded_by,
            status: self
                .status
                .parse::<SubmissionStatus>()
                .unwrap_or(SubmissionStatus::Submitted),
            instructor_feedback: self.instructor_feedback,
            rubric_scores: self
                .rubric_scores
                .and_then(|raw| serde_json::from_str(&raw).ok()),
            created_at: super::from_ts(self.created_at),
            updated_at: super::from_ts(self.updated_at),
        }
    }
}
