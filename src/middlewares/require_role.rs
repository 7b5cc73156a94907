//! 角色校验中间件
//!
//! 依赖 `RequireJWT` 先写入的 `AuthContext`，挂在需要讲师或管理员权限的资源上：
//!
//! ```rust,ignore
//! web::resource("/{id}/statistics")
//!     .wrap(RequireRole::staff())
//!     .route(web::get().to(get_assignment_statistics))
//! ```

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use super::create_error_response;
use crate::models::{
    ErrorCode,
    auth::entities::{AuthContext, UserRole},
};

#[derive(Clone)]
pub struct RequireRole {
    allowed: Rc<[UserRole]>,
}

impl RequireRole {
    pub fn new(allowed: &[UserRole]) -> Self {
        Self {
            allowed: Rc::from(allowed),
        }
    }

    /// 讲师或管理员
    pub fn staff() -> Self {
        Self::new(UserRole::staff_roles())
    }
}

/// 角色判定，拒绝时返回状态码、错误码与提示
fn check_role(
    auth: Option<&AuthContext>,
    allowed: &[UserRole],
) -> Result<(), (StatusCode, ErrorCode, &'static str)> {
    match auth {
        Some(auth) if allowed.contains(&auth.role) => Ok(()),
        Some(auth) => {
            info!(
                "Role {} of user {} not in {:?}",
                auth.role, auth.user_id, allowed
            );
            Err((
                StatusCode::FORBIDDEN,
                ErrorCode::Forbidden,
                "Insufficient role for this operation",
            ))
        }
        None => {
            info!("Role check without auth context, RequireJWT missing on route");
            Err((
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                "Authentication required",
            ))
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            allowed: self.allowed.clone(),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    allowed: Rc<[UserRole]>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_service::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let verdict = check_role(req.extensions().get::<AuthContext>(), &self.allowed);

        match verdict {
            Ok(()) => {
                let srv = self.service.clone();
                Box::pin(async move { Ok(srv.call(req).await?.map_into_left_body()) })
            }
            Err((status, code, message)) => {
                let response = create_error_response(status, code, message).map_into_right_body();
                Box::pin(async move { Ok(req.into_response(response)) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test as actix_test;
    use actix_web::{App, HttpResponse, web};

    #[test]
    fn test_check_role() {
        let staff = UserRole::staff_roles();
        let student = AuthContext::new("u1", UserRole::Student);
        let admin = AuthContext::new("a1", UserRole::Admin);

        assert!(check_role(Some(&admin), staff).is_ok());
        assert_eq!(
            check_role(Some(&student), staff).unwrap_err().0,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            check_role(None, staff).unwrap_err().0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn test_rejects_without_auth_context() {
        let app = actix_test::init_service(
            App::new().service(
                web::resource("/staff")
                    .wrap(RequireRole::staff())
                    .route(web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/staff").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
