use serde::Serialize;
use ts_rs::TS;

use crate::models::PaginatedResponse;
use crate::models::submissions::entities::AssignmentSubmission;

pub type SubmissionListResponse = PaginatedResponse<AssignmentSubmission>;

/// 提交历史（某学员某作业的所有尝试，按 attempt 倒序）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionHistoryResponse {
    pub assignment_id: String,
    pub user_id: String,
    pub attempts: Vec<AssignmentSubmission>,
}
