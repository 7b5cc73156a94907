use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// 为进度类枚举生成 as_str / Display / FromStr / Deserialize
macro_rules! string_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),* $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)*
                    _ => Err(format!(
                        "无效的{}: '{s}'. 支持: {}",
                        $label,
                        [$($text),*].join(", ")
                    )),
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

// 进度单元类型
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/progress.ts")]
pub enum ProgressType {
    Lesson,
    Quiz,
    Assignment,
    Module,
    Course,
}

string_enum!(ProgressType, "进度类型", {
    Lesson => "lesson",
    Quiz => "quiz",
    Assignment => "assignment",
    Module => "module",
    Course => "course",
});

// 进度状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/progress.ts")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

string_enum!(ProgressStatus, "进度状态", {
    NotStarted => "not_started",
    InProgress => "in_progress",
    Completed => "completed",
    Failed => "failed",
    Skipped => "skipped",
});

impl ProgressStatus {
    /// 终态：completed / failed / skipped
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressStatus::Completed | ProgressStatus::Failed | ProgressStatus::Skipped
        )
    }
}

/// 学习进度行（每个被跟踪的单元一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/progress.ts")]
pub struct CourseProgress {
    pub id: String,
    pub enrollment_id: String,
    pub course_id: String,
    pub user_id: String,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub quiz_id: Option<String>,
    pub assignment_id: Option<String>,
    pub progress_type: ProgressType,
    pub status: ProgressStatus,
    pub completion_percentage: f64,
    pub time_spent_minutes: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub max_score: Option<f64>,
    pub attempts: i32,
    pub max_attempts: Option<i32>,
    pub is_mandatory: bool,
    pub weight: f64,
    // 视频/音频播放位置（秒）
    pub current_position: Option<i32>,
    pub bookmarks: Option<Vec<String>>,
    pub notes: Option<String>,
    pub difficulty_rating: Option<i32>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 进度单元的自然键
///
/// 同一用户、课程、类型及单元 ID 组合至多对应一行进度。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub user_id: String,
    pub course_id: String,
    pub progress_type: ProgressType,
    pub module_id: Option<String>,
    pub lesson_id: Option<String>,
    pub quiz_id: Option<String>,
    pub assignment_id: Option<String>,
}

impl ProgressKey {
    /// 编码为存储层唯一约束使用的字符串
    pub fn encode(&self) -> String {
        [
            self.user_id.as_str(),
            self.course_id.as_str(),
            self.progress_type.as_str(),
            self.module_id.as_deref().unwrap_or(""),
            self.lesson_id.as_deref().unwrap_or(""),
            self.quiz_id.as_deref().unwrap_or(""),
            self.assignment_id.as_deref().unwrap_or(""),
        ]
        .join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_enums_roundtrip_text() {
        assert_eq!("in_progress".parse::<ProgressStatus>(), Ok(ProgressStatus::InProgress));
        assert_eq!(ProgressType::Quiz.to_string(), "quiz");
        assert!("done".parse::<ProgressStatus>().is_err());
        assert!(ProgressStatus::Skipped.is_terminal());
        assert!(!ProgressStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_progress_key_distinguishes_units() {
        let lesson = ProgressKey {
            user_id: "u1".into(),
            course_id: "c1".into(),
            progress_type: ProgressType::Lesson,
            module_id: None,
            lesson_id: Some("l1".into()),
            quiz_id: None,
            assignment_id: None,
        };
        assert_eq!(lesson.encode(), "u1|c1|lesson||l1||");

        let mut module = lesson.clone();
        module.progress_type = ProgressType::Module;
        module.lesson_id = None;
        module.module_id = Some("l1".into());
        assert_ne!(lesson.encode(), module.encode());
    }
}
