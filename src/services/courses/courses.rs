use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CourseService;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::{error_response, validation_response};
use crate::models::courses::requests::CreateCourseRequest;
use crate::models::{ApiResponse, ErrorCode};

pub async fn create_course(
    service: &CourseService,
    request: &HttpRequest,
    auth: AuthContext,
    req: CreateCourseRequest,
) -> ActixResult<HttpResponse> {
    let course = match req.validate(&auth.user_id) {
        Ok(course) => course,
        Err(errors) => return Ok(validation_response(errors)),
    };

    match service.get_storage(request).create_course(course).await {
        Ok(course) => {
            info!("Course {} created by {}", course.id, auth.user_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(course, "课程创建成功")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: String,
) -> ActixResult<HttpResponse> {
    match service.get_storage(request).get_course_by_id(&course_id).await {
        Ok(Some(course)) => Ok(HttpResponse::Ok().json(ApiResponse::success(course, "查询成功"))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::CourseNotFound, "课程不存在"))),
        Err(e) => Ok(error_response(&e)),
    }
}
