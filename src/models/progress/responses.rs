use serde::Serialize;
use ts_rs::TS;

use crate::models::PaginatedResponse;
use crate::models::courses::entities::Enrollment;
use crate::models::progress::entities::CourseProgress;

pub type ProgressListResponse = PaginatedResponse<CourseProgress>;

/// 课程完成度（按权重汇总必修单元）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/progress.ts")]
pub struct CourseCompletionResponse {
    pub enrollment_id: String,
    pub completion_percentage: f64,
    pub mandatory_units: i64,
    pub completed_units: i64,
    pub enrollment: Enrollment,
}
