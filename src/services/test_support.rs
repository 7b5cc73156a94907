//! 测试夹具：内存数据库 + 内存缓存 + 一门课程，以及签发测试令牌

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::cache::object_cache::moka::MokaCacheWrapper;
use crate::config::AppConfig;
use crate::models::auth::entities::UserRole;
use crate::models::courses::{
    entities::{Assignment, Course, Enrollment},
    requests::{NewAssignment, NewCourse},
};
use crate::storage::Storage;
use crate::storage::sea_orm_storage::SeaOrmStorage;
use crate::utils::jwt::Claims;
use crate::utils::random_code::generate_id;

pub(crate) struct Fixture {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub course: Course,
    pub assignment: Assignment,
    pub enrollment: Enrollment,
}

fn new_assignment(course_id: &str) -> NewAssignment {
    NewAssignment {
        course_id: course_id.to_string(),
        module_id: Some("m1".to_string()),
        lesson_id: None,
        title: "Essay".to_string(),
        description: None,
        max_score: 100.0,
        passing_score: 60.0,
        due_date: None,
        allow_late_submission: true,
        late_penalty_percent: 0.0,
        max_attempts: None,
        created_by: "i1".to_string(),
    }
}

/// 课程 + 默认作业 + u1 的选课记录
pub(crate) async fn fixture() -> Fixture {
    fixture_with(Arc::new(SeaOrmStorage::in_memory().await.unwrap())).await
}

/// 临时 SQLite 文件库，drop 时删除库文件及 WAL 附属文件
pub(crate) struct TempDatabase {
    pub path: PathBuf,
}

impl TempDatabase {
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("lms-test-{}.db", generate_id())),
        }
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// 多连接文件库上的夹具，用于并发写入场景
pub(crate) async fn file_fixture(db: &TempDatabase, pool_size: u32) -> Fixture {
    let storage = SeaOrmStorage::sqlite_file(&db.path, pool_size)
        .await
        .unwrap();
    fixture_with(Arc::new(storage)).await
}

async fn fixture_with(storage: Arc<dyn Storage>) -> Fixture {
    let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_settings(100, 60));

    let course = storage
        .create_course(NewCourse {
            title: "Rust 101".to_string(),
            description: None,
            created_by: "i1".to_string(),
        })
        .await
        .unwrap();
    let assignment = storage
        .create_assignment(new_assignment(&course.id))
        .await
        .unwrap();
    let enrollment = storage.create_enrollment("u1", &course.id).await.unwrap();

    Fixture {
        storage,
        cache,
        course,
        assignment,
        enrollment,
    }
}

impl Fixture {
    /// 在夹具课程下创建作业，`edit` 修改默认字段
    pub async fn create_assignment(&self, edit: impl FnOnce(&mut NewAssignment)) -> Assignment {
        let mut assignment = new_assignment(&self.course.id);
        edit(&mut assignment);
        self.storage.create_assignment(assignment).await.unwrap()
    }
}

/// 用当前配置的密钥签发一小时有效的令牌，返回 Authorization 头的值
pub(crate) fn bearer_token(user_id: &str, role: UserRole) -> String {
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};

    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        exp: (now + chrono::Duration::hours(1)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(AppConfig::get().jwt.secret.as_ref()),
    )
    .unwrap();
    format!("Bearer {token}")
}
