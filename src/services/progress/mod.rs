pub mod completion;
pub mod ledger;
pub mod lesson;
pub mod list;
pub mod record;
pub mod rules;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

pub use ledger::ProgressLedger;

use crate::models::auth::entities::AuthContext;
use crate::models::progress::requests::{
    LessonProgressRequest, ProgressListQuery, RecordProgressRequest,
    UpdateProgressPercentageRequest, UpdateProgressStatusRequest,
};
use crate::storage::Storage;

pub struct ProgressService {
    storage: Option<Arc<dyn Storage>>,
}

impl ProgressService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
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

    pub(crate) fn ledger(&self, request: &HttpRequest) -> ProgressLedger {
        ProgressLedger::new(self.get_storage(request))
    }

    /// 记录进度（按自然键新增或合并）
    pub async fn record_progress(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        req: RecordProgressRequest,
    ) -> ActixResult<HttpResponse> {
        record::record_progress(self, request, auth, req).await
    }

    /// 记录当前用户的课时进度
    pub async fn record_lesson_progress(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        lesson_id: String,
        req: LessonProgressRequest,
    ) -> ActixResult<HttpResponse> {
        record::record_progress(self, request, auth, req.into_record(lesson_id)).await
    }

    /// 获取当前用户的课时进度
    pub async fn get_lesson_progress(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        lesson_id: String,
    ) -> ActixResult<HttpResponse> {
        lesson::get_lesson_progress(self, request, auth, lesson_id).await
    }

    pub async fn get_progress(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        progress_id: String,
    ) -> ActixResult<HttpResponse> {
        list::get_progress(self, request, auth, progress_id).await
    }

    pub async fn list_progress(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        query: ProgressListQuery,
    ) -> ActixResult<HttpResponse> {
        list::list_progress(self, request, auth, query).await
    }

    pub async fn update_percentage(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        progress_id: String,
        req: UpdateProgressPercentageRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_percentage(self, request, auth, progress_id, req).await
    }

    pub async fn update_status(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        progress_id: String,
        req: UpdateProgressStatusRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_status(self, request, auth, progress_id, req).await
    }

    /// 选课完成度
    pub async fn get_course_completion(
        &self,
        request: &HttpRequest,
        auth: AuthContext,
        enrollment_id: String,
    ) -> ActixResult<HttpResponse> {
        completion::get_course_completion(self, request, auth, enrollment_id).await
    }
}
