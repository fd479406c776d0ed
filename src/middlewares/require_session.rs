/*!
 * 会话认证中间件
 *
 * 根据会话 Cookie 找到服务端的浏览器会话，确认其中有已登录身份，
 * 并在令牌临近过期时先行刷新。通过后会话放入请求扩展：
 *
 * ```rust,ignore
 * web::scope("/api/v1")
 *     .wrap(RequireSession)
 *     .route("/dashboard", web::get().to(handler))
 *
 * async fn handler(req: HttpRequest) -> ActixResult<HttpResponse> {
 *     let session = RequireSession::extract_session(&req);
 *     ...
 * }
 * ```
 *
 * 没有会话、会话未登录或刷新被拒绝时返回 401。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info, warn};

use crate::errors::PortalError;
use crate::models::ErrorCode;
use crate::session::{PortalSession, SessionRegistry};
use crate::utils::session_cookie::extract_session_id;

use super::create_error_response;

#[derive(Clone)]
pub struct RequireSession;

// 拒绝原因：(状态码, 错误码, 消息)
type Rejection = (StatusCode, ErrorCode, &'static str);

async fn resolve_session(req: &ServiceRequest) -> Result<Arc<PortalSession>, Rejection> {
    let registry = req
        .app_data::<web::Data<SessionRegistry>>()
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            "Session registry is not configured",
        ))?
        .clone();

    let id = extract_session_id(req.request()).ok_or((
        StatusCode::UNAUTHORIZED,
        ErrorCode::Unauthorized,
        "Not signed in",
    ))?;
    let session = registry.get(&id).await.ok_or((
        StatusCode::UNAUTHORIZED,
        ErrorCode::SessionExpired,
        "Session expired, please sign in again",
    ))?;

    let state = match session.provider.ensure_fresh().await {
        Ok(state) => state,
        Err(PortalError::Authentication(_)) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                ErrorCode::SessionExpired,
                "Session expired, please sign in again",
            ));
        }
        Err(e) => {
            // 后端暂时不可用时沿用当前令牌
            warn!("Token refresh for session {} failed: {}", id, e);
            session.provider.state()
        }
    };

    if state.identity.is_none() {
        return Err((StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, "Not signed in"));
    }
    Ok(session)
}

impl<S, B> Transform<S, ServiceRequest> for RequireSession
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireSessionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireSessionMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireSessionMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireSessionMiddleware<S>
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
            match resolve_session(&req).await {
                Ok(session) => {
                    debug!("Session {} authenticated for {}", session.id, req.path());
                    req.extensions_mut().insert(session);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                Err((status, code, message)) => {
                    info!(
                        "Session authentication failed for request to {}: {}",
                        req.path(),
                        message
                    );
                    Ok(req.into_response(
                        create_error_response(status, code, message).map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireSession {
    /// 从请求扩展中取出会话，应在应用了本中间件的处理程序中使用
    pub fn extract_session(req: &actix_web::HttpRequest) -> Option<Arc<PortalSession>> {
        req.extensions().get::<Arc<PortalSession>>().cloned()
    }
}
