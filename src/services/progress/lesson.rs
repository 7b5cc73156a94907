use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ProgressService;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::error_response;
use crate::models::progress::{entities::ProgressType, requests::ProgressListQuery};
use crate::models::ApiResponse;

pub async fn get_lesson_progress(
    service: &ProgressService,
    request: &HttpRequest,
    auth: AuthContext,
    lesson_id: String,
) -> ActixResult<HttpResponse> {
    let query = ProgressListQuery {
        user_id: Some(auth.user_id),
        lesson_id: Some(lesson_id),
        progress_type: Some(ProgressType::Lesson),
        ..Default::default()
    };

    match service.ledger(request).list(query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response.items, "查询成功"))),
        Err(e) => Ok(error_response(&e)),
    }
}
