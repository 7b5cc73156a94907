//! 学习进度实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "course_progress")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// 自然键编码，唯一
    pub progress_key: String,
    pub enrollment_id: String,
    pub course_id: String,
    pub user_id: String,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub quiz_id: Option<String>,
    pub assignment_id: Option<String>,
    pub progress_type: String,
    pub status: String,
    pub completion_percentage: f64,
    pub time_spent_minutes: i64,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub last_accessed_at: Option<i64>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub attempts: i32,
    pub max_attempts: Option<i32>,
    pub is_mandatory: bool,
    pub weight: f64,
    pub current_position: Option<i32>,
    /// JSON 数组
    #[sea_orm(column_type = "Text", nullable)]
    pub bookmarks: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub difficulty_rating: Option<i32>,
    #[sea_orm(column_type = "Text", nullable)]
    pub feedback: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::enrollments::Entity",
        from = "Column::EnrollmentId",
        to = "super::enrollments::Column::Id"
    )]
    Enrollment,
}

impl Related<super::enrollments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_progress(self) -> crate::models::progress::entities::CourseProgress {
        use crate::models::progress::entities::{CourseProgress, ProgressStatus, ProgressType};

        CourseProgress {
            id: self.id,
            enrollment_id: self.enrollment_id,
            course_id: self.course_id,
            user_id: self.user_id,
            module_id: self.module_id,
            lesson_id: self.lesson_id,
            quiz_id: self.quiz_id,
            assignment_id: self.assignment_id,
            progress_type: self
                .progress_type
                .parse::<ProgressType>()
                .unwrap_or(ProgressType::Lesson),
            status: self
                .status
                .parse::<ProgressStatus>()
                .unwrap_or(ProgressStatus::NotStarted),
            completion_percentage: self.completion_percentage,
            time_spent_minutes: self.time_spent_minutes,
            started_at: self.started_at.map(super::from_ts),
            completed_at: self.completed_at.map(super::from_ts),
            last_accessed_at: self.last_accessed_at.map(super::from_ts),
            score: self.score,
            max_score: self.max_score,
            attempts: self.attempts,
            max_attempts: self.max_attempts,
            is_mandatory: self.is_mandatory,
            weight: self.weight,
            current_position: self.current_position,
            bookmarks: self
                .bookmarks
                .and_then(|raw| serde_json::from_str(&raw).ok()),
            notes: self.notes,
            difficulty_rating: self.difficulty_rating,
            feedback: self.feedback,
            created_at: super::from_ts(self.created_at),
            updated_at: super::from_ts(self.updated_at),
        }
    }
}
