use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::errors::LmsError;
use crate::models::common::response::error_response;
use crate::models::{ApiResponse, ErrorCode};

pub async fn get_assignment_statistics(
    service: &SubmissionService,
    request: &HttpRequest,
    assignment_id: String,
) -> ActixResult<HttpResponse> {
    match service.tracker(request).statistics(&assignment_id).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats, "查询成功"))),
        Err(LmsError::NotFound(msg)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::AssignmentNotFound, msg))),
        Err(e) => Ok(error_response(&e)),
    }
}
