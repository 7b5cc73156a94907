//! 作业定义实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub course_id: String,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub max_score: f64,
    pub passing_score: f64,
    pub due_date: Option<i64>,
    pub allow_late_submission: bool,
    pub late_penalty_percent: f64,
    pub max_attempts: Option<i32>,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id"
    )]
    Course,
    #[sea_orm(has_many = "super::assignment_submissions::Entity")]
    Submissions,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::assignment_submissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_assignment(self) -> crate::models::courses::entities::Assignment {
        use crate::models::courses::entities::Assignment;

        Assignment {
            id: self.id,
            course_id: self.course_id,
            module_id: self.module_id,
            lesson_id: self.lesson_id,
            title: self.title,
            description: self.description,
            max_score: self.max_score,
            passing_score: self.passing_score,
            due_date: self.due_date.map(super::from_ts),
            allow_late_submission: self.allow_late_submission,
            late_penalty_percent: self.late_penalty_percent,
            max_attempts: self.max_attempts,
            created_by: self.created_by,
            created_at: super::from_ts(self.created_at),
            updated_at: super::from_ts(self.updated_at),
        }
    }
}
