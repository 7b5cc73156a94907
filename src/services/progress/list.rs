use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProgressService;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::error_response;
use crate::models::progress::requests::ProgressListQuery;
use crate::models::{ApiResponse, ErrorCode};

pub async fn list_progress(
    service: &ProgressService,
    request: &HttpRequest,
    auth: AuthContext,
    mut query: ProgressListQuery,
) -> ActixResult<HttpResponse> {
    // 学员只能查看自己的进度
    if !auth.is_staff() {
        query.user_id = Some(auth.user_id);
    }

    match service.ledger(request).list(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "查询成功"))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_progress(
    service: &ProgressService,
    request: &HttpRequest,
    auth: AuthContext,
    progress_id: String,
) -> ActixResult<HttpResponse> {
    match service.ledger(request).get(&progress_id).await {
        Ok(Some(progress)) if auth.can_access_user(&progress.user_id) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(progress, "查询成功")))
        }
        Ok(Some(_)) => Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "没有查看该进度的权限",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::ProgressNotFound, "进度不存在"))),
        Err(e) => Ok(error_response(&e)),
    }
}
