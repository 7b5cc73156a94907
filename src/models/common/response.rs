use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::errors::LmsError;
use crate::models::common::validation::summarize;
use crate::models::{ErrorCode, FieldError};

// 统一的API响应结构
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/api.ts")]
pub struct ApiResponse<T: TS> {
    pub success: bool,
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<FieldError>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T: TS> ApiResponse<T> {
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: Some(data),
            validation_errors: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error(code: ErrorCode, data: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code as i32,
            message: message.into(),
            data: Some(data),
            validation_errors: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn success_empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: ErrorCode::Success as i32,
            message: message.into(),
            data: None,
            validation_errors: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn error_empty(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code as i32,
            message: message.into(),
            data: None,
            validation_errors: Vec::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn validation_failed(errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            code: ErrorCode::ValidationFailed as i32,
            message: "请求参数校验失败".to_string(),
            data: None,
            validation_errors: errors,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// 错误对应的 HTTP 状态码与业务错误码
pub fn error_status(err: &LmsError) -> (StatusCode, ErrorCode) {
    match err {
        LmsError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::ValidationFailed),
        LmsError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NotFound),
        LmsError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
        LmsError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized),
        LmsError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
        ),
    }
}

/// 把业务层错误转换为统一响应；非预期错误记录日志并返回原始信息
pub fn error_response(err: &LmsError) -> HttpResponse {
    let (status, code) = error_status(err);
    if !err.is_expected() {
        #[cfg(debug_assertions)]
        tracing::error!("{}", err.format_colored());
        #[cfg(not(debug_assertions))]
        tracing::error!("{}", err.format_simple());
    }
    HttpResponse::build(status).json(ApiResponse::error_empty(code, err.message()))
}

/// 字段校验失败响应 (400)
pub fn validation_response(errors: Vec<FieldError>) -> HttpResponse {
    tracing::debug!("Validation failed: {}", summarize(&errors));
    HttpResponse::BadRequest().json(ApiResponse::validation_failed(errors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&LmsError::not_found("x")).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&LmsError::authorization("x")).0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            error_status(&LmsError::conflict("x")),
            (StatusCode::CONFLICT, ErrorCode::Conflict)
        );
        assert_eq!(
            error_status(&LmsError::database_operation("x")).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_envelope_shape() {
        let body = serde_json::to_value(ApiResponse::success(3, "ok")).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], 3);
        assert!(body.get("validation_errors").is_none());

        let failed = ApiResponse::validation_failed(vec![FieldError {
            field: "score".into(),
            message: "must not be negative".into(),
        }]);
        let body = serde_json::to_value(failed).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], ErrorCode::ValidationFailed as i32);
        assert_eq!(body["validation_errors"][0]["field"], "score");
    }
}
