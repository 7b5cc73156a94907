use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, error::InternalError};

use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_id;

/// 经过格式校验的路径参数 `{id}`
#[derive(Debug, Clone)]
pub struct SafeId(pub String);

impl FromRequest for SafeId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let raw = req.match_info().get("id").unwrap_or_default();
        ready(match validate_id(raw) {
            Ok(()) => Ok(SafeId(raw.to_string())),
            Err(msg) => {
                let response = actix_web::HttpResponse::BadRequest().json(
                    ApiResponse::error_empty(ErrorCode::BadRequest, format!("无效的路径参数: {msg}")),
                );
                Err(InternalError::from_response(msg, response).into())
            }
        })
    }
}
