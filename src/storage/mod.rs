use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{
    courses::{
        entities::{Assignment, Course, Enrollment, EnrollmentStatus},
        requests::{EnrollmentListQuery, NewAssignment, NewCourse},
        responses::EnrollmentListResponse,
    },
    progress::{
        entities::{CourseProgress, ProgressKey},
        requests::ProgressListQuery,
        responses::ProgressListResponse,
    },
    submissions::{
        entities::AssignmentSubmission, requests::SubmissionListQuery,
        responses::SubmissionListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 根据同一 (user, assignment) 的最新一次提交构造新提交，在事务内调用
pub type SubmissionDraft =
    Box<dyn FnOnce(Option<AssignmentSubmission>) -> Result<AssignmentSubmission> + Send>;

/// 根据已有进度行（不存在时为 None）计算写入后的进度行，在事务内调用
pub type ProgressMerge = Box<dyn FnOnce(Option<CourseProgress>) -> CourseProgress + Send>;

/// 修改已存在的进度行，在事务内调用
pub type ProgressPatch = Box<dyn FnOnce(CourseProgress) -> CourseProgress + Send>;

/// 评分写入
#[derive(Debug, Clone)]
pub struct GradeUpdate {
    pub score: f64,
    pub is_passed: bool,
    pub instructor_feedback: Option<String>,
    pub rubric_scores: Option<std::collections::HashMap<String, f64>>,
    pub graded_by: String,
    pub graded_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 课程目录
    async fn create_course(&self, course: NewCourse) -> Result<Course>;
    async fn get_course_by_id(&self, course_id: &str) -> Result<Option<Course>>;
    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment>;
    async fn get_assignment_by_id(&self, assignment_id: &str) -> Result<Option<Assignment>>;
    async fn list_course_assignments(&self, course_id: &str) -> Result<Vec<Assignment>>;

    /// 选课
    // 重复选课返回 Conflict
    async fn create_enrollment(&self, user_id: &str, course_id: &str) -> Result<Enrollment>;
    async fn get_enrollment_by_id(&self, enrollment_id: &str) -> Result<Option<Enrollment>>;
    async fn list_enrollments_with_pagination(
        &self,
        query: EnrollmentListQuery,
    ) -> Result<EnrollmentListResponse>;
    // 写入汇总完成度及对应的状态与完成时间
    async fn update_enrollment_progress(
        &self,
        enrollment_id: &str,
        percentage: f64,
        status: EnrollmentStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Enrollment>>;

    /// 作业提交
    // 在同一事务内读取最新提交并插入新提交
    async fn create_submission_attempt(
        &self,
        user_id: &str,
        assignment_id: &str,
        draft: SubmissionDraft,
    ) -> Result<AssignmentSubmission>;
    async fn get_submission_by_id(&self, submission_id: &str)
    -> Result<Option<AssignmentSubmission>>;
    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse>;
    async fn get_latest_submission(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Option<AssignmentSubmission>>;
    // 按 attempt_number 倒序
    async fn list_user_attempts(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Vec<AssignmentSubmission>>;
    async fn grade_submission(
        &self,
        submission_id: &str,
        grade: GradeUpdate,
    ) -> Result<Option<AssignmentSubmission>>;
    // 仅删除未评分的提交，返回是否删除
    async fn delete_ungraded_submission(&self, submission_id: &str) -> Result<bool>;
    // (score, is_passed) 列表，用于统计
    async fn list_assignment_scores(&self, assignment_id: &str)
    -> Result<Vec<(Option<f64>, bool)>>;

    /// 学习进度
    // 按自然键在事务内新增或合并，返回 (进度, 是否新建)
    async fn upsert_progress(
        &self,
        key: &ProgressKey,
        merge: ProgressMerge,
    ) -> Result<(CourseProgress, bool)>;
    async fn update_progress_by_id(
        &self,
        progress_id: &str,
        patch: ProgressPatch,
    ) -> Result<Option<CourseProgress>>;
    async fn get_progress_by_id(&self, progress_id: &str) -> Result<Option<CourseProgress>>;
    async fn list_progress_with_pagination(
        &self,
        query: ProgressListQuery,
    ) -> Result<ProgressListResponse>;
    async fn list_enrollment_progress(&self, enrollment_id: &str) -> Result<Vec<CourseProgress>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
