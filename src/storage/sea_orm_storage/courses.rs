//! 课程与作业定义存储操作

use super::SeaOrmStorage;
use crate::entity::assignments::{
    ActiveModel as AssignmentActiveModel, Column as AssignmentColumn, Entity as Assignments,
};
use crate::entity::courses::{ActiveModel, Entity as Courses};
use crate::errors::{LmsError, Result};
use crate::models::courses::{
    entities::{Assignment, Course},
    requests::{NewAssignment, NewCourse},
};
use crate::utils::random_code::generate_id;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建课程
    pub async fn create_course_impl(&self, course: NewCourse) -> Result<Course> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            id: Set(generate_id()),
            title: Set(course.title),
            description: Set(course.description),
            created_by: Set(course.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建课程失败: {e}")))?;

        Ok(result.into_course())
    }

    /// 通过 ID 获取课程
    pub async fn get_course_by_id_impl(&self, course_id: &str) -> Result<Option<Course>> {
        let result = Courses::find_by_id(course_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 创建作业定义
    pub async fn create_assignment_impl(&self, assignment: NewAssignment) -> Result<Assignment> {
        let now = chrono::Utc::now().timestamp();

        let model = AssignmentActiveModel {
            id: Set(generate_id()),
            course_id: Set(assignment.course_id),
            module_id: Set(assignment.module_id),
            lesson_id: Set(assignment.lesson_id),
            title: Set(assignment.title),
            description: Set(assignment.description),
            max_score: Set(assignment.max_score),
            passing_score: Set(assignment.passing_score),
            due_date: Set(assignment.due_date.map(|d| d.timestamp())),
            allow_late_submission: Set(assignment.allow_late_submission),
            late_penalty_percent: Set(assignment.late_penalty_percent),
            max_attempts: Set(assignment.max_attempts),
            created_by: Set(assignment.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("创建作业失败: {e}")))?;

        Ok(result.into_assignment())
    }

    /// 通过 ID 获取作业定义
    pub async fn get_assignment_by_id_impl(&self, assignment_id: &str) -> Result<Option<Assignment>> {
        let result = Assignments::find_by_id(assignment_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询作业失败: {e}")))?;

        Ok(result.map(|m| m.into_assignment()))
    }

    /// 列出课程下的作业（按创建时间）
    pub async fn list_course_assignments_impl(&self, course_id: &str) -> Result<Vec<Assignment>> {
        let results = Assignments::find()
            .filter(AssignmentColumn::CourseId.eq(course_id))
            .order_by_asc(AssignmentColumn::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询作业列表失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_assignment()).collect())
    }
}
