//! 作业提交存储操作

use super::SeaOrmStorage;
use crate::entity::assignment_submissions::{ActiveModel, Column, Entity as Submissions};
use crate::errors::{LmsError, Result, map_write_conflict};
use crate::models::{
    PaginationInfo, PaginationQuery,
    submissions::{
        entities::{AssignmentSubmission, SubmissionStatus},
        requests::SubmissionListQuery,
        responses::SubmissionListResponse,
    },
};
use crate::storage::{GradeUpdate, SubmissionDraft};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

fn to_active_model(s: &AssignmentSubmission) -> Result<ActiveModel> {
    let rubric_scores = s
        .rubric_scores
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    Ok(ActiveModel {
        id: Set(s.id.clone()),
        user_id: Set(s.user_id.clone()),
        assignment_id: Set(s.assignment_id.clone()),
        course_id: Set(s.course_id.clone()),
        module_id: Set(s.module_id.clone()),
        lesson_id: Set(s.lesson_id.clone()),
        submission_text: Set(s.submission_text.clone()),
        file_urls: Set(serde_json::to_string(&s.file_urls)?),
        score: Set(s.score),
        max_score: Set(s.max_score),
        attempt_number: Set(s.attempt_number),
        is_passed: Set(s.is_passed),
        is_late: Set(s.is_late),
        late_penalty_applied: Set(s.late_penalty_applied),
        submitted_at: Set(s.submitted_at.timestamp()),
        graded_at: Set(s.graded_at.map(|t| t.timestamp())),
        graded_by: Set(s.graded_by.clone()),
        status: Set(s.status.to_string()),
        instructor_feedback: Set(s.instructor_feedback.clone()),
        rubric_scores: Set(rubric_scores),
        created_at: Set(s.created_at.timestamp()),
        updated_at: Set(s.updated_at.timestamp()),
    })
}

impl SeaOrmStorage {
    /// 创建新一次提交
    ///
    /// 最新提交的读取与插入在同一事务内完成；并发提交若得到相同序号，
    /// 由 (user_id, assignment_id, attempt_number) 唯一约束拒绝，SQLite 下也可能
    /// 表现为写锁竞争，两者都返回 Conflict。
    pub async fn create_submission_attempt_impl(
        &self,
        user_id: &str,
        assignment_id: &str,
        draft: SubmissionDraft,
    ) -> Result<AssignmentSubmission> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| LmsError::database_operation(format!("开启事务失败: {e}")))?;

        let latest = Submissions::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_desc(Column::AttemptNumber)
            .one(&txn)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询最新提交失败: {e}")))?;

        let submission = draft(latest.map(|m| m.into_submission()))?;

        let result = to_active_model(&submission)?
            .insert(&txn)
            .await
            .map_err(|e| map_write_conflict(e, "提交序号冲突，请重试"))?;

        txn.commit()
            .await
            .map_err(|e| map_write_conflict(e, "提交序号冲突，请重试"))?;

        Ok(result.into_submission())
    }

    /// 通过 ID 获取提交
    pub async fn get_submission_by_id_impl(
        &self,
        submission_id: &str,
    ) -> Result<Option<AssignmentSubmission>> {
        let result = Submissions::find_by_id(submission_id.to_string())
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 获取学生某作业的最新提交
    pub async fn get_latest_submission_impl(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Option<AssignmentSubmission>> {
        let result = Submissions::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_desc(Column::AttemptNumber)
            .one(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询最新提交失败: {e}")))?;

        Ok(result.map(|m| m.into_submission()))
    }

    /// 获取学生某作业的全部提交
    pub async fn list_user_attempts_impl(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Vec<AssignmentSubmission>> {
        let results = Submissions::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::AssignmentId.eq(assignment_id))
            .order_by_desc(Column::AttemptNumber)
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提交历史失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_submission()).collect())
    }

    /// 列出提交（分页，按提交时间倒序）
    pub async fn list_submissions_with_pagination_impl(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        let (page, size) = PaginationQuery::from_parts(query.page, query.size).normalized();

        let mut select = Submissions::find();

        if let Some(ref user_id) = query.user_id {
            select = select.filter(Column::UserId.eq(user_id));
        }
        if let Some(ref assignment_id) = query.assignment_id {
            select = select.filter(Column::AssignmentId.eq(assignment_id));
        }
        if let Some(ref course_id) = query.course_id {
            select = select.filter(Column::CourseId.eq(course_id));
        }
        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.as_str()));
        }
        if let Some(ref graded_by) = query.graded_by {
            select = select.filter(Column::GradedBy.eq(graded_by));
        }

        select = select
            .order_by_desc(Column::SubmittedAt)
            .order_by_desc(Column::AttemptNumber);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提交总数失败: {e}")))?;
        let submissions = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询提交列表失败: {e}")))?;

        Ok(SubmissionListResponse {
            items: submissions
                .into_iter()
                .map(|m| m.into_submission())
                .collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 写入评分；提交不存在（或已被撤回）时返回 None
    pub async fn grade_submission_impl(
        &self,
        submission_id: &str,
        grade: GradeUpdate,
    ) -> Result<Option<AssignmentSubmission>> {
        let rubric_scores = grade
            .rubric_scores
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let graded_at = grade.graded_at.timestamp();

        let result = Submissions::update_many()
            .col_expr(Column::Score, Expr::value(Some(grade.score)))
            .col_expr(Column::IsPassed, Expr::value(grade.is_passed))
            .col_expr(Column::InstructorFeedback, Expr::value(grade.instructor_feedback))
            .col_expr(Column::RubricScores, Expr::value(rubric_scores))
            .col_expr(Column::GradedBy, Expr::value(Some(grade.graded_by)))
            .col_expr(Column::GradedAt, Expr::value(Some(graded_at)))
            .col_expr(Column::Status, Expr::value(SubmissionStatus::GRADED))
            .col_expr(Column::UpdatedAt, Expr::value(graded_at))
            .filter(Column::Id.eq(submission_id))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("评分失败: {e}")))?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.get_submission_by_id_impl(submission_id).await
    }

    /// 删除未评分的提交
    pub async fn delete_ungraded_submission_impl(&self, submission_id: &str) -> Result<bool> {
        let result = Submissions::delete_many()
            .filter(Column::Id.eq(submission_id))
            .filter(Column::Status.ne(SubmissionStatus::GRADED))
            .exec(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("删除提交失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 作业下全部提交的 (score, is_passed)
    pub async fn list_assignment_scores_impl(
        &self,
        assignment_id: &str,
    ) -> Result<Vec<(Option<f64>, bool)>> {
        Submissions::find()
            .select_only()
            .column(Column::Score)
            .column(Column::IsPassed)
            .filter(Column::AssignmentId.eq(assignment_id))
            .into_tuple::<(Option<f64>, bool)>()
            .all(&self.db)
            .await
            .map_err(|e| LmsError::database_operation(format!("查询作业成绩失败: {e}")))
    }
}
