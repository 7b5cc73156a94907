//! 选课实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub status: String,
    pub progress_percentage: f64,
    pub enrolled_at: i64,
    pub completed_at: Option<i64>,
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
    #[sea_orm(has_many = "super::course_progress::Entity")]
    Progress,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::course_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_enrollment(self) -> crate::models::courses::entities::Enrollment {
        use crate::models::courses::entities::{Enrollment, EnrollmentStatus};

        Enrollment {
            id: self.id,
            user_id: self.user_id,
            course_id: self.course_id,
            status: self
                .status
                .parse::<EnrollmentStatus>()
                .unwrap_or(EnrollmentStatus::Active),
            progress_percentage: self.progress_percentage,
            enrolled_at: super::from_ts(self.enrolled_at),
            completed_at: self.completed_at.map(super::from_ts),
            updated_at: super::from_ts(self.updated_at),
        }
    }
}
