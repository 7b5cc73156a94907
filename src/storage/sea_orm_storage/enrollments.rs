//! 选课存储操作

use super::SeaOrmStorage;
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments};
use crate::errors::{LmsError, Result, map_unique_violation};
use crate::models::{
    PaginationInfo, PaginationQuery,
    courses::{
        entities::{Enrollment, EnrollmentStatus},
        requests::EnrollmentListQuery,
        responses::EnrollmentListResponse,
    },
};
use crate::utils::random_code::generate_id;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    /// 选课（同一用户同一课程唯一）
    pub async fn create_enrollment_impl(&self, user_id: &str, course_id: &str) -> Result<Enrollment> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            id: Set(generate_id()),
            user_id: Set(user_id.to_string()),
            course_id: Set(course_id.to_string()),
            status: Set(EnrollmentStatus::Active.to_string()),
            progress_percentage: Set(0.0),
            enrolled_at: Set(now),
            completed_at: Set(None),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| map_unique_violation(e, "已选修该课程"))?;

        Ok(result.into_enrollment())
    }

    /// 通过 ID 获取选课记录
    pub async fn get_enrollment_by_id_impl(&self, enrollment_id: &str) -> Result<Option<Enrollment>> {
        let result = Enrollments::find_by_id(enrollment_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?;

        Ok(result.map(|m| m.into_enrollment()))
    }

    /// 列出选课记录（分页）
    pub async fn list_enrollments_with_pagination_impl(
        &self,
        query: EnrollmentListQuery,
    ) -> Result<EnrollmentListResponse> {
        let (page, size) = PaginationQuery::from_parts(query.page, query.size).normalized();

        let mut select = Enrollments::find();
        if let Some(ref user_id) = query.user_id {
            select = select.filter(Column::UserId.eq(user_id));
        }
        if let Some(ref course_id) = query.course_id {
            select = select.filter(Column::CourseId.eq(course_id));
        }
        select = select.order_by_desc(Column::EnrolledAt);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课总数失败: {e}")))?;
        let enrollments = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课列表失败: {e}")))?;

        Ok(EnrollmentListResponse {
            items: enrollments.into_iter().map(|m| m.into_enrollment()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 写入课程完成度
    pub async fn update_enrollment_progress_impl(
        &self,
        enrollment_id: &str,
        percentage: f64,
        status: EnrollmentStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Enrollment>> {
        let Some(existing) = Enrollments::find_by_id(enrollment_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课记录失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.progress_percentage = Set(percentage);
        model.status = Set(status.to_string());
        model.completed_at = Set(completed_at.map(|t| t.timestamp()));
        model.updated_at = Set(chrono::Utc::now().timestamp());

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("更新选课进度失败: {e}")))?;

        Ok(Some(result.into_enrollment()))
    }
}
