use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::errors::LmsError;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::error_response;
use crate::models::{ApiResponse, ErrorCode};

pub async fn delete_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    auth: AuthContext,
    submission_id: String,
) -> ActixResult<HttpResponse> {
    match service.tracker(request).delete(&auth, &submission_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty("提交已撤回"))),
        Err(LmsError::NotFound(_)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::SubmissionNotFound, "提交不存在"))),
        Err(LmsError::Conflict(msg)) => Ok(HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::SubmissionAlreadyGraded, msg))),
        Err(e) => Ok(error_response(&e)),
    }
}
