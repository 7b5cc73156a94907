pub mod create;
pub mod delete;
pub mod detail;
pub mod grade;
pub mod list;
pub mod rules;
pub mod stats;
pub mod tracker;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

pub use tracker::SubmissionTracker;

use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::models::auth::entities::AuthContext;
use crate::models::submissions::requests::{
    CreateSubmissionRequest, SubmissionListQuery, UpdateSubmissionRequest,
};
use crate::storage::Storage;

pub struct SubmissionService {
    storage: Option<Arc<dyn Storage>>,
    cache: Option<Arc<dyn ObjectCache>>,
}

impl SubmissionService {
    pub fn new_lazy() -> Self {
        Self {
            storage: None,
            cache: None,
        }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn get_cache(&self, request: &HttpRequest) -> Arc<dyn ObjectCache> {
        if let Some(cache) = &self.cache {
            cache.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn ObjectCache>>>()
                .expect("Cache not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn tracker(&self, request: &HttpRequest) -> SubmissionTracker {
        SubmissionTracker::new(
            self.get_storage(request),
            self.get_cache(request),
            AppConfig::get().submissions.statistics_ttl,
        )
    }

    /// 提交作业
    pub async fn create_submission(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        req: CreateSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_submission(self, request, auth, req).await
    }

    /// 获取提交详情
    pub async fn get_submission(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        submission_id: String,
    ) -> ActixResult<HttpResponse> {
        detail::get_submission(self, request, auth, submission_id).await
    }

    /// 获取当前用户某作业的最新提交
    pub async fn get_latest_submission(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        assignment_id: String,
    ) -> ActixResult<HttpResponse> {
        detail::get_latest_submission(self, request, auth, assignment_id).await
    }

    /// 获取当前用户某作业的提交历史
    pub async fn list_attempt_history(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        assignment_id: String,
    ) -> ActixResult<HttpResponse> {
        detail::list_attempt_history(self, request, auth, assignment_id).await
    }

    /// 列出提交
    pub async fn list_submissions(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        query: SubmissionListQuery,
    ) -> ActixResult<HttpResponse> {
        list::list_submissions(self, request, auth, query).await
    }

    /// 待评分队列
    pub async fn list_pending_submissions(
        &self,
        request: &HttpRequest,
        query: SubmissionListQuery,
    ) -> ActixResult<HttpResponse> {
        list::list_pending_submissions(self, request, query).await
    }

    /// 更新提交（目前仅评分）
    pub async fn update_submission(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        req: UpdateSubmissionRequest,
    ) -> ActixResult<HttpResponse> {
        match req {
            UpdateSubmissionRequest::Grade(grade) => {
                grade::grade_submission(self, request, auth, grade).await
            }
        }
    }

    /// 撤回提交
    pub async fn delete_submission(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        submission_id: String,
    ) -> ActixResult<HttpResponse> {
        delete::delete_submission(self, request, auth, submission_id).await
    }

    /// 作业提交统计
    pub async fn get_assignment_statistics(
        &self,
        request: &HttpRequest,
        assignment_id: String,
    ) -> ActixResult<HttpResponse> {
        stats::get_assignment_statistics(self, request, assignment_id).await
    }
}
