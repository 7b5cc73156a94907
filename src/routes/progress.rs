use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::require_auth;
use crate::middlewares;
use crate::models::progress::requests::{
    LessonProgressRequest, ProgressListQuery, RecordProgressRequest,
    UpdateProgressPercentageRequest, UpdateProgressStatusRequest,
};
use crate::services::ProgressService;
use crate::utils::SafeId;

// 懒加载的全局 ProgressService 实例
static PROGRESS_SERVICE: Lazy<ProgressService> = Lazy::new(ProgressService::new_lazy);

// 记录进度
pub async fn record_progress(
    req: HttpRequest,
    body: web::Json<RecordProgressRequest>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    PROGRESS_SERVICE
        .record_progress(&req, auth, body.into_inner())
        .await
}

// 列出进度
pub async fn list_progress(
    req: HttpRequest,
    query: web::Query<ProgressListQuery>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    PROGRESS_SERVICE
        .list_progress(&req, auth, query.into_inner())
        .await
}

// 获取进度详情
pub async fn get_progress(req: HttpRequest, path: SafeId) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    PROGRESS_SERVICE.get_progress(&req, auth, path.0).await
}

// 更新完成百分比
pub async fn update_percentage(
    req: HttpRequest,
    path: SafeId,
    body: web::Json<UpdateProgressPercentageRequest>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    PROGRESS_SERVICE
        .update_percentage(&req, auth, path.0, body.into_inner())
        .await
}

// 更新状态
pub async fn update_status(
    req: HttpRequest,
    path: SafeId,
    body: web::Json<UpdateProgressStatusRequest>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    PROGRESS_SERVICE
        .update_status(&req, auth, path.0, body.into_inner())
        .await
}

// 记录课时进度
pub async fn record_lesson_progress(
    req: HttpRequest,
    path: SafeId, // lesson_id
    body: web::Json<LessonProgressRequest>,
) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    PROGRESS_SERVICE
        .record_lesson_progress(&req, auth, path.0, body.into_inner())
        .await
}

// 获取课时进度
pub async fn get_lesson_progress(req: HttpRequest, path: SafeId) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    PROGRESS_SERVICE
        .get_lesson_progress(&req, auth, path.0)
        .await
}

// 选课完成度（/enrollments 路由中注册）
pub async fn get_course_completion(req: HttpRequest, path: SafeId) -> ActixResult<HttpResponse> {
    let auth = match require_auth(&req) {
        Ok(auth) => auth,
        Err(resp) => return Ok(resp),
    };

    PROGRESS_SERVICE
        .get_course_completion(&req, auth, path.0)
        .await
}

// 配置路由
pub fn configure_progress_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/progress")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_progress))
                    .route(web::post().to(record_progress)),
            )
            .service(web::resource("/{id}").route(web::get().to(get_progress)))
            .service(web::resource("/{id}/percentage").route(web::patch().to(update_percentage)))
            .service(web::resource("/{id}/status").route(web::patch().to(update_status))),
    );

    cfg.service(
        web::scope("/api/v1/lessons")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/{id}/progress")
                    .route(web::get().to(get_lesson_progress))
                    .route(web::post().to(record_lesson_progress)),
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

    use crate::models::auth::entities::UserRole;
    use crate::services::test_support::{bearer_token, fixture};

    #[actix_web::test]
    async fn test_record_progress_created_then_merged() {
        let fx = fixture().await;
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fx.storage.clone()))
                .app_data(web::Data::new(fx.cache.clone()))
                .configure(configure_progress_routes),
        )
        .await;
        let record = |percentage: f64| {
            actix_test::TestRequest::post()
                .uri("/api/v1/progress")
                .insert_header(("Authorization", bearer_token("u1", UserRole::Student)))
                .set_json(json!({
                    "enrollment_id": fx.enrollment.id,
                    "course_id": fx.course.id,
                    "progress_type": "lesson",
                    "lesson_id": "l1",
                    "completion_percentage": percentage,
                }))
                .to_request()
        };

        let resp = actix_test::call_service(&app, record(40.0)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = actix_test::read_body_json(resp).await;

        let resp = actix_test::call_service(&app, record(80.0)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let merged: Value = actix_test::read_body_json(resp).await;
        assert_eq!(merged["data"]["id"], created["data"]["id"]);
        assert_eq!(merged["data"]["completion_percentage"], 80.0);
    }

    #[actix_web::test]
    async fn test_student_list_is_scoped_to_own_progress() {
        let fx = fixture().await;
        let other = fx
            .storage
            .create_enrollment("u2", &fx.course.id)
            .await
            .unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(fx.storage.clone()))
                .app_data(web::Data::new(fx.cache.clone()))
                .configure(configure_progress_routes),
        )
        .await;

        for (user, enrollment_id) in [("u1", &fx.enrollment.id), ("u2", &other.id)] {
            let req = actix_test::TestRequest::post()
                .uri("/api/v1/progress")
                .insert_header(("Authorization", bearer_token(user, UserRole::Student)))
                .set_json(json!({
                    "enrollment_id": enrollment_id,
                    "course_id": fx.course.id,
                    "progress_type": "lesson",
                    "lesson_id": "l1",
                    "completion_percentage": 10.0,
                }))
                .to_request();
            let resp = actix_test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/progress?user_id=u2")
            .insert_header(("Authorization", bearer_token("u1", UserRole::Student)))
            .to_request();
        let json: Value = actix_test::call_and_read_body_json(&app, req).await;
        let items = json["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["user_id"], "u1");

        let req = actix_test::TestRequest::get()
            .uri("/api/v1/progress?user_id=u2")
            .insert_header(("Authorization", bearer_token("a1", UserRole::Admin)))
            .to_request();
        let json: Value = actix_test::call_and_read_body_json(&app, req).await;
        let items = json["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["user_id"], "u2");
    }
}
