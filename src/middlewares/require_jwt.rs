/*!
 * JWT 认证中间件
 *
 * 验证 `Authorization: Bearer <JWT>`，把令牌声明转换为 [`AuthContext`]
 * 存入请求扩展。令牌由外部身份服务签发，本服务只做校验。
 *
 * ## 使用方法
 *
 * ```rust,ignore
 * use actix_web::{web, App};
 * use crate::middlewares::RequireJWT;
 *
 * App::new().service(
 *     web::scope("/api/v1")
 *         .wrap(RequireJWT)
 *         .route("/progress", web::get().to(list_progress)),
 * );
 *
 * async fn list_progress(req: HttpRequest) -> ActixResult<HttpResponse> {
 *     let Some(auth) = RequireJWT::extract_auth(&req) else { ... };
 *     ...
 * }
 * ```
 *
 * ## 认证流程
 *
 * 1. 客户端在请求头中包含 `Authorization: Bearer <JWT_TOKEN>`
 * 2. 中间件用配置中的 `jwt.secret` 校验签名与过期时间
 * 3. 声明中的 `sub` / `role` 转换为 `AuthContext`
 * 4. 令牌缺失、无效或角色未知时返回 401
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info};

use super::create_error_response;
use crate::models::ErrorCode;
use crate::models::auth::entities::AuthContext;
use crate::utils::jwt::JwtUtils;

const BEARER_PREFIX: &str = "Bearer ";
const AUTHORIZATION_HEADER: &str = "Authorization";

#[derive(Clone)]
pub struct RequireJWT;

// 提取并验证 JWT，返回身份上下文
fn extract_and_validate_jwt(req: &ServiceRequest) -> Result<AuthContext, String> {
    let token = req
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| "Missing or invalid Authorization header".to_string())?;

    let claims = JwtUtils::verify_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        "Invalid JWT token".to_string()
    })?;

    claims
        .into_auth_context()
        .map_err(|err| err.message().to_string())
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 预检请求直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(
                    create_error_response(StatusCode::NO_CONTENT, ErrorCode::Success, "")
                        .map_into_right_body(),
                ));
            }

            match extract_and_validate_jwt(&req) {
                Ok(auth) => {
                    debug!(
                        "JWT authentication successful for {} ({})",
                        auth.user_id, auth.role
                    );
                    req.extensions_mut().insert(auth);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err(err) => {
                    info!(
                        "JWT authentication failed for request to {}: {}",
                        req.path(),
                        err
                    );
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

// 从请求中提取身份信息
impl RequireJWT {
    /// 从请求扩展中提取身份上下文
    /// 此函数应该在应用了RequireJWT中间件的路由处理程序中使用
    pub fn extract_auth(req: &actix_web::HttpRequest) -> Option<AuthContext> {
        req.extensions().get::<AuthContext>().cloned()
    }
}
