use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProgressService;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::{error_response, validation_response};
use crate::models::progress::requests::RecordProgressRequest;
use crate::models::ApiResponse;

/// 新建返回 201，合并返回 200
pub async fn record_progress(
    service: &ProgressService,
    request: &HttpRequest,
    auth: AuthContext,
    req: RecordProgressRequest,
) -> ActixResult<HttpResponse> {
    let command = match req.validate(&auth.user_id) {
        Ok(command) => command,
        Err(errors) => return Ok(validation_response(errors)),
    };

    match service.ledger(request).record(&auth, command).await {
        Ok((progress, true)) => {
            Ok(HttpResponse::Created().json(ApiResponse::success(progress, "进度已创建")))
        }
        Ok((progress, false)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(progress, "进度已更新")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
