use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::require_auth;
use crate::middlewares;
use crate::models::courses::requests::{
    CreateAssignmentRequest, CreateCourseRequest, EnrollmentListQuery,
};
use crate::services::CourseService;
use crate::utils::SafeId;

// 懒加载的全局 CourseService 实例
static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);

// 创建课程
pub async fn create_course(
    req: HttpRequest,
    body: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    COURSE_SERVICE
        .create_course(&req, auth, body.into_inner())
        .await
}

// 获取课程
pub async fn get_course(req: HttpRequest, path: SafeId) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(&req, path.0).await
}

// 创建作业
pub async fn create_assignment(
    req: HttpRequest,
    path: SafeId, // course_id
    body: web::Json<CreateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    COURSE_SERVICE
        .create_assignment(&req, auth, path.0, body.into_inner())
        .await
}

// 课程下的作业列表
pub async fn list_assignments(req: HttpRequest, path: SafeId) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_assignments(&req, path.0).await
}

// 获取作业详情
pub async fn get_assignment(req: HttpRequest, path: SafeId) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_assignment(&req, path.0).await
}

// 选修课程
pub async fn enroll(req: HttpRequest, path: SafeId) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    COURSE_SERVICE.enroll(&req, auth, path.0).await
}

// 选课记录列表
pub async fn list_enrollments(
    req: HttpRequest,
    query: web::Query<EnrollmentListQuery>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    COURSE_SERVICE
        .list_enrollments(&req, auth, query.into_inner())
        .await
}

// 获取选课记录
pub async fn get_enrollment(req: HttpRequest, path: SafeId) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    COURSE_SERVICE.get_enrollment(&req, auth, path.0).await
}

// 配置路由
pub fn configure_courses_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("").route(
                    web::post()
                        .to(create_course)
                        .wrap(middlewares::RequireRole::staff()),
                ),
            )
            .service(web::resource("/{id}").route(web::get().to(get_course)))
            .service(
                web::resource("/{id}/assignments")
                    .route(web::get().to(list_assignments))
                    .route(
                        web::post()
                            .to(create_assignment)
                            .wrap(middlewares::RequireRole::staff()),
                    ),
            )
            .service(web::resource("/{id}/enroll").route(web::post().to(enroll))),
    );

    cfg.service(
        web::scope("/api/v1/enrollments")
            .wrap(middlewares::RequireJWT)
            .service(web::resource("").route(web::get().to(list_enrollments)))
            .service(web::resource("/{id}").route(web::get().to(get_enrollment)))
            .service(
                web::resource("/{id}/completion")
                    .route(web::get().to(super::progress::get_course_completion)),
            ),
    );
}
