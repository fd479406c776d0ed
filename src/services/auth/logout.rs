use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::warn;

use crate::models::ApiResponse;
use crate::queries::QueryClient;
use crate::services::cache_from;
use crate::utils::session_cookie::{create_empty_session_cookie, extract_session_id};

use super::AuthService;

/// 处理用户登出
/// 远端注销失败时本地会话照样丢弃，并清除浏览器上的会话 Cookie
pub async fn handle_logout(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let empty_cookie = create_empty_session_cookie();

    let registry = match service.get_registry(request) {
        Ok(registry) => registry,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };
    let session = match extract_session_id(request) {
        Some(id) => registry.get(&id).await,
        None => None,
    };

    if let Some(session) = session {
        // 注销前记下访问者，用于清理其查询缓存
        if let Ok(cache) = cache_from(request) {
            QueryClient::for_session(cache, &session)
                .await
                .invalidate_viewer()
                .await;
        }
        if let Err(e) = session.provider.sign_out().await {
            warn!("Session {} signed out locally only: {}", session.id, e);
        }
        registry.remove(&session.id).await;
    }

    Ok(HttpResponse::Ok()
        .cookie(empty_cookie)
        .json(ApiResponse::success_empty("Logout successful")))
}
