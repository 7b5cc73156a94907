use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::error_response;
use crate::models::submissions::responses::SubmissionHistoryResponse;
use crate::models::{ApiResponse, ErrorCode};

/// 提交者本人或讲师/管理员可查看
pub async fn get_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    auth: AuthContext,
    submission_id: String,
) -> ActixResult<HttpResponse> {
    match service.tracker(request).get(&submission_id).await {
        Ok(Some(submission)) => {
            if !auth.can_access_user(&submission.user_id) {
                return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                    ErrorCode::Forbidden,
                    "没有查看该提交的权限",
                )));
            }
            Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "查询成功")))
        }
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::SubmissionNotFound, "提交不存在"))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_latest_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    auth: AuthContext,
    assignment_id: String,
) -> ActixResult<HttpResponse> {
    match service
        .tracker(request)
        .latest_attempt(&auth.user_id, &assignment_id)
        .await
    {
        Ok(Some(submission)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "查询成功")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::SubmissionNotFound,
            "尚未提交该作业",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn list_attempt_history(
    service: &SubmissionService,
    request: &HttpRequest,
    auth: AuthContext,
    assignment_id: String,
) -> ActixResult<HttpResponse> {
    match service
        .tracker(request)
        .attempt_history(&auth.user_id, &assignment_id)
        .await
    {
        Ok(attempts) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            SubmissionHistoryResponse {
                assignment_id,
                user_id: auth.user_id,
                attempts,
            },
            "查询成功",
        ))),
        Err(e) => Ok(error_response(&e)),
    }
}
