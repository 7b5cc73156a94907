use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::{error_response, validation_response};
use crate::models::submissions::requests::GradeSubmissionRequest;
use crate::models::{ApiResponse, ErrorCode};

/// 评分（角色由路由中间件限制为讲师/管理员）
pub async fn grade_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    auth: AuthContext,
    req: GradeSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let (submission_id, command) = match req.validate() {
        Ok(parts) => parts,
        Err(errors) => return Ok(validation_response(errors)),
    };

    match service
        .tracker(request)
        .grade(&submission_id, command, &auth)
        .await
    {
        Ok(Some(submission)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "评分成功")))
        }
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::SubmissionNotFound, "提交不存在"))),
        Err(e) => Ok(error_response(&e)),
    }
}
