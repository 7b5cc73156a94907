use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 提交状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub enum SubmissionStatus {
    Submitted,   // 已提交，待评分
    Graded,      // 已评分
    Returned,    // 已退回
    Resubmitted, // 已重新提交
}

impl SubmissionStatus {
    pub const SUBMITTED: &'static str = "submitted";
    pub const GRADED: &'static str = "graded";
    pub const RETURNED: &'static str = "returned";
    pub const RESUBMITTED: &'static str = "resubmitted";

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => Self::SUBMITTED,
            SubmissionStatus::Graded => Self::GRADED,
            SubmissionStatus::Returned => Self::RETURNED,
            SubmissionStatus::Resubmitted => Self::RESUBMITTED,
        }
    }
}

impl<'de> Deserialize<'de> for SubmissionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::SUBMITTED => Ok(SubmissionStatus::Submitted),
            Self::GRADED => Ok(SubmissionStatus::Graded),
            Self::RETURNED => Ok(SubmissionStatus::Returned),
            Self::RESUBMITTED => Ok(SubmissionStatus::Resubmitted),
            _ => Err(format!(
                "无效的提交状态: '{s}'. 支持的状态: submitted, graded, returned, resubmitted"
            )),
        }
    }
}

/// 作业提交（每次提交一行，按 attempt_number 递增）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct AssignmentSubmission {
    pub id: String,
    pub user_id: String,
    pub assignment_id: String,
    pub course_id: String,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub submission_text: Option<String>,
    pub file_urls: Vec<String>,
    // 评分前为空
    pub score: Option<f64>,
    pub max_score: f64,
    pub attempt_number: i32,
    pub is_passed: bool,
    pub is_late: bool,
    // 迟交扣分百分比
    pub late_penalty_applied: Option<f64>,
    pub submitted_at: DateTime<Utc>,
    pub graded_at: Option<DateTime<Utc>>,
    pub graded_by: Option<String>,
    pub status: SubmissionStatus,
    pub instructor_feedback: Option<String>,
    pub rubric_scores: Option<HashMap<String, f64>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 单个作业的提交统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmissionStatistics {
    pub assignment_id: String,
    pub total_submissions: i64,
    pub graded_submissions: i64,
    pub average_score: f64,
    pub pass_rate: f64,
}
