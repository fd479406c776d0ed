use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use crate::models::dashboard::GateView;
use crate::models::{ApiResponse, auth::SessionResponse};
use crate::utils::session_cookie::{create_empty_session_cookie, extract_session_id};

use super::{AuthService, session_response};

// 未登录：直接给出登录页，不登记会话
fn signed_out() -> SessionResponse {
    SessionResponse {
        identity: None,
        profile: None,
        loading: false,
        view: GateView::Login,
    }
}

/// 返回当前浏览器会话的状态；只有登录/注册才会建立会话
pub async fn handle_session(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let registry = match service.get_registry(request) {
        Ok(registry) => registry,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };

    let requested = extract_session_id(request);
    let existing = match requested {
        Some(id) => registry.get(&id).await,
        None => None,
    };
    let Some(session) = existing else {
        let mut response = HttpResponse::Ok();
        // 会话已过期或不存在，清掉浏览器里的旧 cookie
        if requested.is_some() {
            response.cookie(create_empty_session_cookie());
        }
        return Ok(response.json(ApiResponse::success(signed_out(), "Session loaded")));
    };

    if let Err(e) = session.provider.ensure_fresh().await {
        debug!("Session {} could not be refreshed: {}", session.id, e);
    }
    let state = session.provider.settled().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        session_response(&session, state),
        "Session loaded",
    )))
}
