use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::auth::entities::AuthContext;
use crate::models::common::response::{error_response, validation_response};
use crate::models::courses::requests::CreateAssignmentRequest;
use crate::models::{ApiResponse, ErrorCode};

pub async fn create_assignment(
    service: &CourseService,
    request: &HttpRequest,
    auth: AuthContext,
    course_id: String,
    req: CreateAssignmentRequest,
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

    let assignment = match req.validate(&course_id, &auth.user_id) {
        Ok(assignment) => assignment,
        Err(errors) => return Ok(validation_response(errors)),
    };

    match storage.create_assignment(assignment).await {
        Ok(assignment) => {
            Ok(HttpResponse::Created().json(ApiResponse::success(assignment, "作业创建成功")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn get_assignment(
    service: &CourseService,
    request: &HttpRequest,
    assignment_id: String,
) -> ActixResult<HttpResponse> {
    match service
        .get_storage(request)
        .get_assignment_by_id(&assignment_id)
        .await
    {
        Ok(Some(assignment)) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(assignment, "查询成功")))
        }
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::error_empty(ErrorCode::AssignmentNotFound, "作业不存在"))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub async fn list_assignments(
    service: &CourseService,
    request: &HttpRequest,
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

    match storage.list_course_assignments(&course_id).await {
        Ok(assignments) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(assignments, "查询成功")))
        }
        Err(e) => Ok(error_response(&e)),
    }
}
