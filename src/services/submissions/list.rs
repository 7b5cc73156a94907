use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::error_response;
use crate::models::submissions::requests::SubmissionListQuery;
use crate::models::ApiResponse;

pub async fn list_submissions(
    service: &SubmissionService,
    request: &HttpRequest,
    auth: AuthContext,
    mut query: SubmissionListQuery,
) -> ActixResult<HttpResponse> {
    // 学员只能查看自己的提交
    if !auth.is_staff() {
        query.user_id = Some(auth.user_id);
    }

    match service.tracker(request).list(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "查询成功"))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn list_pending_submissions(
    service: &SubmissionService,
    request: &HttpRequest,
    query: SubmissionListQuery,
) -> ActixResult<HttpResponse> {
    match service.tracker(request).pending(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "查询成功"))),
        Err(e) => Ok(error_response(&e)),
    }
}
