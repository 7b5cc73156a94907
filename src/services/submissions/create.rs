use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::SubmissionService;
use crate::errors::LmsError;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::{error_response, validation_response};
use crate::models::submissions::requests::CreateSubmissionRequest;
use crate::models::{ApiResponse, ErrorCode};

pub async fn create_submission(
    service: &SubmissionService,
    request: &HttpRequest,
    auth: AuthContext,
    req: CreateSubmissionRequest,
) -> ActixResult<HttpResponse> {
    let command = match req.validate() {
        Ok(command) => command,
        Err(errors) => return Ok(validation_response(errors)),
    };

    let tracker = service.tracker(request);
    let assignment_id = command.assignment_id.clone();

    match tracker.submit(&auth, command).await {
        Ok(submission) => {
            Ok(HttpResponse::Created().json(ApiResponse::success(submission, "提交成功")))
        }
        Err(LmsError::Conflict(msg)) => {
            let code = match tracker.attempts_exhausted(&auth.user_id, &assignment_id).await {
                Ok(true) => ErrorCode::AttemptLimitReached,
                _ => ErrorCode::SubmissionConflict,
            };
            Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(code, msg)))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
