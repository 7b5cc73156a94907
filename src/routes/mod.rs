pub mod courses;

pub mod progress;

pub mod submissions;

pub use courses::configure_courses_routes;
pub use progress::configure_progress_routes;
pub use submissions::configure_submissions_routes;

use actix_web::{HttpRequest, HttpResponse};

use crate::middlewares::RequireJWT;
use crate::models::auth::entities::AuthContext;
use crate::models::{ApiResponse, ErrorCode};

// 取出 RequireJWT 写入的身份上下文
pub(crate) fn require_auth(req: &HttpRequest) -> Result<AuthContext, HttpResponse> {
    RequireJWT::extract_auth(req).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "无法获取用户信息",
        ))
    })
}
