use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CourseService;
use crate::errors::LmsError;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::error_response;
use crate::models::courses::requests::EnrollmentListQuery;
use crate::models::{ApiResponse, ErrorCode};

pub async fn enroll(
    service: &CourseService,
    request: &HttpRequest,
    auth: AuthContext,
    course_id: String,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    match storage.get_course_by_id(&course_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::error_empty(ErrorCode::CourseNotFound, "课程不存在")));
        }
        Err(e) => return Ok(error_response(&e)),
    }

    match storage.create_enrollment(&auth.user_id, &course_id).await {
        Ok(enrollment) => {
            info!("User {} enrolled in course {}", auth.user_id, course_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(enrollment, "选课成功")))
        }
        Err(LmsError::Conflict(msg)) => Ok(HttpResponse::Conflict()
            .json(ApiResponse::error_empty(ErrorCode::AlreadyEnrolled, msg))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_enrollment(
    service: &CourseService,
    request: &HttpRequest,
    auth: AuthContext,
    enrollment_id: String,
) -> ActixResult<HttpResponse> {
    match service
        .get_storage(request)
        .get_enrollment_by_id(&enrollment_id)
        .await
    {
        Ok(Some(enrollment)) if auth.can_access_user(&enrollment.user_id) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(enrollment, "查询成功")))
        }
        Ok(Some(_)) => Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "没有查看该选课记录的权限",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::EnrollmentNotFound, "选课记录不存在"))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn list_enrollments(
    service: &CourseService,
    request: &HttpRequest,
    auth: AuthContext,
    mut query: EnrollmentListQuery,
) -> ActixResult<HttpResponse> {
    // 学员只能查看自己的选课记录
    if !auth.is_staff() {
        query.user_id = Some(auth.user_id);
    }

    match service
        .get_storage(request)
        .list_enrollments_with_pagination(query)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response, "查询成功"))),
        Err(e) => Ok(error_response(&e)),
    }
}
