use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProgressService;
use crate::errors::LmsError;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::error_response;
use crate::models::{ApiResponse, ErrorCode};

pub async fn get_course_completion(
    service: &ProgressService,
    request: &HttpRequest,
    auth: AuthContext,
    enrollment_id: String,
) -> ActixResult<HttpResponse> {
    match service
        .ledger(request)
        .course_completion(&auth, &enrollment_id)
        .await
    {
        Ok(completion) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(completion, "查询成功")))
        }
        Err(LmsError::NotFound(msg)) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::EnrollmentNotFound, msg))),
        Err(e) => Ok(error_response(&e)),
    }
}
