//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod courses;
mod enrollments;
mod progress;
mod submissions;

use crate::config::{AppConfig, DatabaseConfig};
use crate::errors::{LmsError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, &config.database).await?
        } else {
            Self::connect_generic(&db_url, &config.database).await?
        };

        let storage = Self::from_connection(db).await?;
        info!("SeaORM 存储初始化完成，数据库: {}", db_url);
        Ok(storage)
    }

    /// 使用已建立的连接创建存储并运行迁移
    pub async fn from_connection(db: DatabaseConnection) -> Result<Self> {
        Migrator::up(&db, None)
            .await
            .map_err(|e| LmsError::database_operation(format!("数据库迁移失败: {e}")))?;
        Ok(Self { db })
    }

    /// 单连接的内存 SQLite，用于测试
    pub async fn in_memory() -> Result<Self> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("SQLite 连接失败: {e}")))?;
        Self::from_connection(db).await
    }

    /// 多连接的 SQLite 文件库，用于并发测试
    #[cfg(test)]
    pub async fn sqlite_file(path: &std::path::Path, pool_size: u32) -> Result<Self> {
        let database = DatabaseConfig {
            url: path.display().to_string(),
            pool_size,
            timeout: 10,
        };
        let url = Self::build_database_url(&database.url)?;
        let db = Self::connect_sqlite(&url, &database).await?;
        Self::from_connection(db).await
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| LmsError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| LmsError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(LmsError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
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
use crate::storage::{GradeUpdate, ProgressMerge, ProgressPatch, Storage, SubmissionDraft};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 课程模块
    async fn create_course(&self, course: NewCourse) -> Result<Course> {
        self.create_course_impl(course).await
    }

    async fn get_course_by_id(&self, course_id: &str) -> Result<Option<Course>> {
        self.get_course_by_id_impl(course_id).await
    }

    async fn create_assignment(&self, assignment: NewAssignment) -> Result<Assignment> {
        self.create_assignment_impl(assignment).await
    }

    async fn get_assignment_by_id(&self, assignment_id: &str) -> Result<Option<Assignment>> {
        self.get_assignment_by_id_impl(assignment_id).await
    }

    async fn list_course_assignments(&self, course_id: &str) -> Result<Vec<Assignment>> {
        self.list_course_assignments_impl(course_id).await
    }

    // 选课模块
    async fn create_enrollment(&self, user_id: &str, course_id: &str) -> Result<Enrollment> {
        self.create_enrollment_impl(user_id, course_id).await
    }

    async fn get_enrollment_by_id(&self, enrollment_id: &str) -> Result<Option<Enrollment>> {
        self.get_enrollment_by_id_impl(enrollment_id).await
    }

    async fn list_enrollments_with_pagination(
        &self,
        query: EnrollmentListQuery,
    ) -> Result<EnrollmentListResponse> {
        self.list_enrollments_with_pagination_impl(query).await
    }

    async fn update_enrollment_progress(
        &self,
        enrollment_id: &str,
        percentage: f64,
        status: EnrollmentStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Enrollment>> {
        self.update_enrollment_progress_impl(enrollment_id, percentage, status, completed_at)
            .await
    }

    // 提交模块
    async fn create_submission_attempt(
        &self,
        user_id: &str,
        assignment_id: &str,
        draft: SubmissionDraft,
    ) -> Result<AssignmentSubmission> {
        self.create_submission_attempt_impl(user_id, assignment_id, draft)
            .await
    }

    async fn get_submission_by_id(
        &self,
        submission_id: &str,
    ) -> Result<Option<AssignmentSubmission>> {
        self.get_submission_by_id_impl(submission_id).await
    }

    async fn list_submissions_with_pagination(
        &self,
        query: SubmissionListQuery,
    ) -> Result<SubmissionListResponse> {
        self.list_submissions_with_pagination_impl(query).await
    }

    async fn get_latest_submission(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Option<AssignmentSubmission>> {
        self.get_latest_submission_impl(user_id, assignment_id)
            .await
    }

    async fn list_user_attempts(
        &self,
        user_id: &str,
        assignment_id: &str,
    ) -> Result<Vec<AssignmentSubmission>> {
        self.list_user_attempts_impl(user_id, assignment_id).await
    }

    async fn grade_submission(
        &self,
        submission_id: &str,
        grade: GradeUpdate,
    ) -> Result<Option<AssignmentSubmission>> {
        self.grade_submission_impl(submission_id, grade).await
    }

    async fn delete_ungraded_submission(&self, submission_id: &str) -> Result<bool> {
        self.delete_ungraded_submission_impl(submission_id).await
    }

    async fn list_assignment_scores(
        &self,
        assignment_id: &str,
    ) -> Result<Vec<(Option<f64>, bool)>> {
        self.list_assignment_scores_impl(assignment_id).await
    }

    // 进度模块
    async fn upsert_progress(
        &self,
        key: &ProgressKey,
        merge: ProgressMerge,
    ) -> Result<(CourseProgress, bool)> {
        self.upsert_progress_impl(key, merge).await
    }

    async fn update_progress_by_id(
        &self,
        progress_id: &str,
        patch: ProgressPatch,
    ) -> Result<Option<CourseProgress>> {
        self.update_progress_by_id_impl(progress_id, patch).await
    }

    async fn get_progress_by_id(&self, progress_id: &str) -> Result<Option<CourseProgress>> {
        self.get_progress_by_id_impl(progress_id).await
    }

    async fn list_progress_with_pagination(
        &self,
        query: ProgressListQuery,
    ) -> Result<ProgressListResponse> {
        self.list_progress_with_pagination_impl(query).await
    }

    async fn list_enrollment_progress(&self, enrollment_id: &str) -> Result<Vec<CourseProgress>> {
        self.list_enrollment_progress_impl(enrollment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("lms.db").unwrap(),
            "sqlite://lms.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("sqlite::memory:").unwrap(),
            "sqlite::memory:"
        );
        assert!(SeaOrmStorage::build_database_url("postgres://u@h/db").is_ok());
        assert!(SeaOrmStorage::build_database_url("oracle://x").is_err());
    }
}
