use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::require_auth;
use crate::middlewares;
use crate::models::submissions::requests::{
    CreateSubmissionRequest, SubmissionListQuery, UpdateSubmissionRequest,
};
use crate::services::SubmissionService;
use crate::utils::SafeId;

// 懒加载的全局 SubmissionService 实例
static SUBMISSION_SERVICE: Lazy<SubmissionService> = Lazy::new(SubmissionService::new_lazy);

// 列出提交
pub async fn list_submissions(
    req: HttpRequest,
    query: web::Query<SubmissionListQuery>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    SUBMISSION_SERVICE
        .list_submissions(&req, auth, query.into_inner())
        .await
}

// 待评分队列
pub async fn list_pending_submissions(
    req: HttpRequest,
    query: web::Query<SubmissionListQuery>,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .list_pending_submissions(&req, query.into_inner())
        .await
}

// 提交作业
pub async fn create_submission(
    req: HttpRequest,
    body: web::Json<CreateSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    SUBMISSION_SERVICE
        .create_submission(&req, auth, body.into_inner())
        .await
}

// 评分
pub async fn update_submission(
    req: HttpRequest,
    body: web::Json<UpdateSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    SUBMISSION_SERVICE
        .update_submission(&req, auth, body.into_inner())
        .await
}

// 获取提交详情
pub async fn get_submission(req: HttpRequest, path: SafeId) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    SUBMISSION_SERVICE.get_submission(&req, auth, path.0).await
}

// 撤回提交
pub async fn delete_submission(req: HttpRequest, path: SafeId) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    SUBMISSION_SERVICE
        .delete_submission(&req, auth, path.0)
        .await
}

// 我的最新提交
pub async fn get_my_latest_submission(
    req: HttpRequest,
    path: SafeId, // assignment_id
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    SUBMISSION_SERVICE
        .get_latest_submission(&req, auth, path.0)
        .await
}

// 我的提交历史
pub async fn list_my_attempts(
    req: HttpRequest,
    path: SafeId, // assignment_id
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    SUBMISSION_SERVICE
        .list_attempt_history(&req, auth, path.0)
        .await
}

// 作业统计
pub async fn get_assignment_statistics(
    req: HttpRequest,
    path: SafeId,
) -> ActixResult<HttpResponse> {
    SUBMISSION_SERVICE
        .get_assignment_statistics(&req, path.0)
        .await
}

// 配置路由
pub fn configure_submissions_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignment-submissions")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_submissions))
                    .route(web::post().to(create_submission))
                    // 评分 - 仅讲师和管理员
                    .route(
                        web::put()
                            .to(update_submission)
                            .wrap(middlewares::RequireRole::staff()),
                    ),
            )
            .service(
                web::resource("/pending")
                    .route(web::get().to(list_pending_submissions))
                    .wrap(middlewares::RequireRole::staff()),
            )
            .service(
                web::resource("/{id}")
                    // 本人或讲师/管理员（业务层检查）
                    .route(web::get().to(get_submission))
                    // 仅本人可撤回（业务层检查）
                    .route(web::delete().to(delete_submission)),
            ),
    );

    // 作业相关路由（作业详情由 CourseService 提供）
    cfg.service(
        web::scope("/api/v1/assignments")
            .wrap(middlewares::RequireJWT)
            .service(web::resource("/{id}").route(web::get().to(super::courses::get_assignment)))
            .service(
                web::resource("/{id}/submissions/latest")
                    .route(web::get().to(get_my_latest_submission)),
            )
            .service(
                web::resource("/{id}/submissions/history").route(web::get().to(list_my_attempts)),
            )
            .service(
                web::resource("/{id}/statistics")
                    .route(web::get().to(get_assignment_statistics))
                    .wrap(middlewares::RequireRole::staff()),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::App;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::{Value, json};

    use crate::models::ErrorCode;
    use crate::models::auth::entities::UserRole;
    use crate::services::test_support::{bearer_token, fixture};

    #[actix_web::test]
    async fn test_grade_route_roles_and_unknown_id() {
        let fx = fixture().await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fx.storage.clone()))
                .app_data(web::Data::new(fx.cache.clone()))
                .configure(configure_submissions_routes),
        )
        .await;
        let body = json!({ "action": "grade", "id": "missing", "score": 50 });

        let req = actix_test::TestRequest::put()
            .uri("/api/v1/assignment-submissions")
            .insert_header(("Authorization", bearer_token("i1", UserRole::Instructor)))
            .set_json(&body)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json: Value = actix_test::read_body_json(resp).await;
        assert_eq!(json["code"], ErrorCode::SubmissionNotFound as i32);

        let req = actix_test::TestRequest::put()
            .uri("/api/v1/assignment-submissions")
            .insert_header(("Authorization", bearer_token("u1", UserRole::Student)))
            .set_json(&body)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_student_list_is_scoped_to_own_submissions() {
        let fx = fixture().await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fx.storage.clone()))
                .app_data(web::Data::new(fx.cache.clone()))
                .configure(configure_submissions_routes),
        )
        .await;

        for user in ["u1", "u2"] {
            let req = actix_test::TestRequest::post()
                .uri("/api/v1/assignment-submissions")
                .insert_header(("Authorization", bearer_token(user, UserRole::Student)))
                .set_json(json!({
                    "assignment_id": fx.assignment.id,
                    "submission_text": "my essay",
                }))
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        // 学员传入他人的 user_id 也只能拿到自己的提交
        let req = actix_test::TestRequest::get()
            .uri("/api/v1/assignment-submissions?user_id=u2")
            .insert_header(("Authorization", bearer_token("u1", UserRole::Student)))
            .to_request();
        let json: Value = actix_test::call_and_read_body_json(&app, req).await;
        let items = json["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["user_id"], "u1");

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/assignment-submissions?user_id=u2")
            .insert_header(("Authorization", bearer_token("i1", UserRole::Instructor)))
            .to_request();
        let json: Value = actix_test::call_and_read_body_json(&app, req).await;
        let items = json["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["user_id"], "u2");
    }

    #[actix_web::test]
    async fn test_attempt_limit_reports_its_own_code() {
        let fx = fixture().await;
        let limited = fx.create_assignment(|a| a.max_attempts = Some(1)).await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fx.storage.clone()))
                .app_data(web::Data::new(fx.cache.clone()))
                .configure(configure_submissions_routes),
        )
        .await;
        let submit = || {
            actix_test::TestRequest::post()
                .uri("/api/v1/assignment-submissions")
                .insert_header(("Authorization", bearer_token("u1", UserRole::Student)))
                .set_json(json!({
                    "assignment_id": limited.id,
                    "submission_text": "my essay",
                }))
                .to_request()
        };

        let resp = actix_test::call_service(&app, submit()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = actix_test::call_service(&app, submit()).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let json: Value = actix_test::read_body_json(resp).await;
        assert_eq!(json["code"], ErrorCode::AttemptLimitReached as i32);
    }
}
