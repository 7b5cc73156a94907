//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_lms_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum LmsError {
            $($variant(String),)*
        }

        impl LmsError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(LmsError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(LmsError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(LmsError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl LmsError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        LmsError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_lms_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    Validation("E006", "Validation Error"),
    NotFound("E007", "Resource Not Found"),
    Conflict("E008", "Conflict"),
    Serialization("E009", "Serialization Error"),
    Authentication("E010", "Authentication Error"),
    Authorization("E011", "Authorization Error"),
}

impl LmsError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否属于业务层可预期的错误（不需要按 500 记录）
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            LmsError::Validation(_)
                | LmsError::NotFound(_)
                | LmsError::Conflict(_)
                | LmsError::Authentication(_)
                | LmsError::Authorization(_)
        )
    }
}

impl fmt::Display for LmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LmsError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LmsError {
    fn from(err: sea_orm::DbErr) -> Self {
        LmsError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LmsError {
    fn from(err: serde_json::Error) -> Self {
        LmsError::Serialization(err.to_string())
    }
}

/// 将唯一约束冲突转换为 Conflict，其余保持为数据库操作错误
pub fn map_unique_violation(err: sea_orm::DbErr, conflict_message: &str) -> LmsError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) => {
            LmsError::conflict(format!("{conflict_message}: {detail}"))
        }
        _ => LmsError::database_operation(err.to_string()),
    }
}

/// SQLite 的 BUSY / LOCKED（含扩展码，如 WAL 下的 BUSY_SNAPSHOT = 517）
fn is_sqlite_lock_contention(err: &sea_orm::DbErr) -> bool {
    use sea_orm::sqlx::sqlite::SqliteError;
    use sea_orm::{DbErr, RuntimeErr};

    let (DbErr::Exec(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
    | DbErr::Conn(RuntimeErr::SqlxError(sqlx_err))) = err
    else {
        return false;
    };
    sqlx_err
        .as_database_error()
        .filter(|db_err| db_err.try_downcast_ref::<SqliteError>().is_some())
        .and_then(|db_err| db_err.code())
        .and_then(|code| code.parse::<i32>().ok())
        // 扩展码的低 8 位是主错误码：5 = BUSY，6 = LOCKED
        .is_some_and(|code| matches!(code & 0xff, 5 | 6))
}

/// 并发写入冲突（唯一约束或 SQLite 写锁竞争）转换为 Conflict，其余为数据库操作错误
pub fn map_write_conflict(err: sea_orm::DbErr, conflict_message: &str) -> LmsError {
    if is_sqlite_lock_contention(&err) {
        return LmsError::conflict(format!("{conflict_message}: {err}"));
    }
    map_unique_violation(err, conflict_message)
}

pub type Result<T> = std::result::Result<T, LmsError>;
