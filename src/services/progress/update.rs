use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProgressService;
use crate::errors::Result;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::error_response;
use crate::models::progress::{
    entities::CourseProgress,
    requests::{UpdateProgressPercentageRequest, UpdateProgressStatusRequest},
};
use crate::models::{ApiResponse, ErrorCode};

fn respond(result: Result<Option<CourseProgress>>) -> HttpResponse {
    match result {
        Ok(Some(progress)) => HttpResponse::Ok().json(ApiResponse::success(progress, "进度已更新")),
        Ok(None) => HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::ProgressNotFound, "进度不存在")),
        Err(e) => error_response(&e),
    }
}

pub async fn update_percentage(
    service: &ProgressService,
    request: &HttpRequest,
    auth: AuthContext,
    progress_id: String,
    req: UpdateProgressPercentageRequest,
) -> ActixResult<HttpResponse> {
    let result = service
        .ledger(request)
        .update_progress(&auth, &progress_id, req.completion_percentage)
        .await;
    Ok(respond(result))
}

pub async fn update_status(
    service: &ProgressService,
    request: &HttpRequest,
    auth: AuthContext,
    progress_id: String,
    req: UpdateProgressStatusRequest,
) -> ActixResult<HttpResponse> {
    let result = service
        .ledger(request)
        .update_status(&auth, &progress_id, req.status)
        .await;
    Ok(respond(result))
}
