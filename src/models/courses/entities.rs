use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 课程
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 作业定义
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct Assignment {
    pub id: String,
    pub course_id: String,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub max_score: f64,
    pub passing_score: f64,
    pub due_date: Option<DateTime<Utc>>,
    pub allow_late_submission: bool,
    pub late_penalty_percent: f64,
    pub max_attempts: Option<i32>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// 选课状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Dropped,
}

impl EnrollmentStatus {
    pub const ACTIVE: &'static str = "active";
    pub const COMPLETED: &'static str = "completed";
    pub const DROPPED: &'static str = "dropped";

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => Self::ACTIVE,
            EnrollmentStatus::Completed => Self::COMPLETED,
            EnrollmentStatus::Dropped => Self::DROPPED,
        }
    }
}

impl<'de> Deserialize<'de> for EnrollmentStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::ACTIVE => Ok(EnrollmentStatus::Active),
            Self::COMPLETED => Ok(EnrollmentStatus::Completed),
            Self::DROPPED => Ok(EnrollmentStatus::Dropped),
            _ => Err(format!(
                "无效的选课状态: '{s}'. 支持的状态: active, completed, dropped"
            )),
        }
    }
}

/// 选课记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/course.ts")]
pub struct Enrollment {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub status: EnrollmentStatus,
    pub progress_percentage: f64,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
