//! 学习进度存储操作

use super::SeaOrmStorage;
use crate::entity::course_progress::{ActiveModel, Column, Entity as CourseProgressEntity};
use crate::errors::{LmsError, Result, map_write_conflict};
use crate::models::{
    PaginationInfo, PaginationQuery,
    progress::{
        entities::{CourseProgress, ProgressKey},
        requests::ProgressListQuery,
        responses::ProgressListResponse,
    },
};
use crate::storage::{ProgressMerge, ProgressPatch};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

fn to_active_model(p: &CourseProgress, progress_key: String) -> Result<ActiveModel> {
    let bookmarks = p
        .bookmarks
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    Ok(ActiveModel {
        id: Set(p.id.clone()),
        progress_key: Set(progress_key),
        enrollment_id: Set(p.enrollment_id.clone()),
        course_id: Set(p.course_id.clone()),
        user_id: Set(p.user_id.clone()),
        module_id: Set(p.module_id.clone()),
        lesson_id: Set(p.lesson_id.clone()),
        quiz_id: Set(p.quiz_id.clone()),
        assignment_id: Set(p.assignment_id.clone()),
        progress_type: Set(p.progress_type.to_string()),
        status: Set(p.status.to_string()),
        completion_percentage: Set(p.completion_percentage),
        time_spent_minutes: Set(p.time_spent_minutes),
        started_at: Set(p.started_at.map(|t| t.timestamp())),
        completed_at: Set(p.completed_at.map(|t| t.timestamp())),
        last_accessed_at: Set(p.last_accessed_at.map(|t| t.timestamp())),
        score: Set(p.score),
        max_score: Set(p.max_score),
        attempts: Set(p.attempts),
        max_attempts: Set(p.max_attempts),
        is_mandatory: Set(p.is_mandatory),
        weight: Set(p.weight),
        current_position: Set(p.current_position),
        bookmarks: Set(bookmarks),
        notes: Set(p.notes.clone()),
        difficulty_rating: Set(p.difficulty_rating),
        feedback: Set(p.feedback.clone()),
        created_at: Set(p.created_at.timestamp()),
        updated_at: Set(p.updated_at.timestamp()),
    })
}

impl SeaOrmStorage {
    /// 按自然键新增或合并进度
    pub async fn upsert_progress_impl(
        &self,
        key: &ProgressKey,
        merge: ProgressMerge,
    ) -> Result<(CourseProgress, bool)> {
        let progress_key = key.encode();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = CourseProgressEntity::find()
            .filter(Column::ProgressKey.eq(progress_key.as_str()))
            .one(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询进度失败: {e}")))?;

        let created = existing.is_none();
        let row = merge(existing.map(|m| m.into_progress()));
        let model = to_active_model(&row, progress_key)?;

        let result = if created {
            model
                .insert(&txn)
                .await
                .map_err(|e| map_write_conflict(e, "进度记录并发写入冲突，请重试"))?
        } else {
            model
                .update(&txn)
                .await
                .map_err(|e| map_write_conflict(e, "进度记录并发写入冲突，请重试"))?
        };

        txn.commit()
            .await
            .map_err(|e| map_write_conflict(e, "进度记录并发写入冲突，请重试"))?;

        Ok((result.into_progress(), created))
    }

    /// 按 ID 合并更新进度
    pub async fn update_progress_by_id_impl(
        &self,
        progress_id: &str,
        patch: ProgressPatch,
    ) -> Result<Option<CourseProgress>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let Some(existing) = CourseProgressEntity::find_by_id(progress_id.to_string())
            .one(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询进度失败: {e}")))?
        else {
            return Ok(None);
        };

        let progress_key = existing.progress_key.clone();
        let row = patch(existing.into_progress());
        let result = to_active_model(&row, progress_key)?
            .update(&txn)
            .await
            .map_err(|e| map_write_conflict(e, "进度记录并发写入冲突，请重试"))?;

        txn.commit()
            .await
            .map_err(|e| map_write_conflict(e, "进度记录并发写入冲突，请重试"))?;

        Ok(Some(result.into_progress()))
    }

    /// 通过 ID 获取进度
    pub async fn get_progress_by_id_impl(&self, progress_id: &str) -> Result<Option<CourseProgress>> {
        let result = CourseProgressEntity::find_by_id(progress_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询进度失败: {e}")))?;

        Ok(result.map(|m| m.into_progress()))
    }

    /// 列出进度（分页，按最近访问时间倒序）
    pub async fn list_progress_with_pagination_impl(
        &self,
        query: ProgressListQuery,
    ) -> Result<ProgressListResponse> {
        let (page, size) = PaginationQuery::from_parts(query.page, query.size).normalized();

        let mut select = CourseProgressEntity::find();
        for (column, value) in [
            (Column::EnrollmentId, &query.enrollment_id),
            (Column::CourseId, &query.course_id),
            (Column::UserId, &query.user_id),
            (Column::ModuleId, &query.module_id),
            (Column::LessonId, &query.lesson_id),
            (Column::QuizId, &query.quiz_id),
            (Column::AssignmentId, &query.assignment_id),
        ] {
            if let Some(value) = value {
                select = select.filter(column.eq(value.as_str()));
            }
        }
        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.as_str()));
        }
        if let Some(progress_type) = query.progress_type {
            select = select.filter(Column::ProgressType.eq(progress_type.as_str()));
        }
        select = select
            .order_by_desc(Column::LastAccessedAt)
            .order_by_desc(Column::UpdatedAt);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询进度总数失败: {e}")))?;
        let rows = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询进度列表失败: {e}")))?;

        Ok(ProgressListResponse {
            items: rows.into_iter().map(|m| m.into_progress()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 选课下的全部进度行
    pub async fn list_enrollment_progress_impl(
        &self,
        enrollment_id: &str,
    ) -> Result<Vec<CourseProgress>> {
        let rows = CourseProgressEntity::find()
            .filter(Column::EnrollmentId.eq(enrollment_id))
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询选课进度失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_progress()).collect())
    }
}
