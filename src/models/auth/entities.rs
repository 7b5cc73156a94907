use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/auth.ts")]
pub enum UserRole {
    Student,    // 学员
    Instructor, // 讲师
    Admin,      // 管理员
}

impl UserRole {
    pub const STUDENT: &'static str = "student";
    pub const INSTRUCTOR: &'static str = "instructor";
    pub const ADMIN: &'static str = "admin";

    pub fn staff_roles() -> &'static [UserRole] {
        &[Self::Instructor, Self::Admin]
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Student => write!(f, "{}", UserRole::STUDENT),
            UserRole::Instructor => write!(f, "{}", UserRole::INSTRUCTOR),
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            UserRole::STUDENT => Ok(UserRole::Student),
            UserRole::INSTRUCTOR => Ok(UserRole::Instructor),
            UserRole::ADMIN => Ok(UserRole::Admin),
            _ => Err(format!(
                "无效的用户角色: '{s}'. 支持的角色: student, instructor, admin"
            )),
        }
    }
}

/// 当前请求的身份上下文
///
/// 由 `RequireJWT` 中间件从令牌声明构造，显式传入业务层，
/// 业务规则不直接读取请求状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: String,
    pub role: UserRole,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// 讲师或管理员
    pub fn is_staff(&self) -> bool {
        matches!(self.role, UserRole::Instructor | UserRole::Admin)
    }

    /// 本人或讲师/管理员可访问
    pub fn can_access_user(&self, user_id: &str) -> bool {
        self.is_staff() || self.user_id == user_id
    }
}
