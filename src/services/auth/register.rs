use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{ApiResponse, auth::SignUpRequest};
use crate::utils::session_cookie::{create_session_cookie, extract_session_id};
use crate::utils::validate::validate_sign_up;

use super::{AuthService, session_response};

pub async fn handle_register(
    service: &AuthService,
    sign_up: SignUpRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 1. 校验注册信息
    if let Err(e) = validate_sign_up(&sign_up) {
        return Ok(ApiResponse::from_error(&e));
    }

    let registry = match service.get_registry(request) {
        Ok(registry) => registry,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };

    // 2. 创建身份与资料
    let session = registry.create().await;
    let state = match session.provider.sign_up(&sign_up).await {
        Ok(state) => state,
        Err(e) => {
            registry.remove(&session.id).await;
            return Ok(ApiResponse::from_error(&e));
        }
    };

    // 3. 需要邮箱确认时没有会话，不下发 Cookie
    if state.identity.is_none() {
        registry.remove(&session.id).await;
        return Ok(HttpResponse::Accepted().json(ApiResponse::success_empty(
            "Registration successful, please confirm your email before signing in",
        )));
    }

    if let Some(previous) = extract_session_id(request) {
        registry.remove(&previous).await;
    }
    tracing::info!("User {} registered as {}", sign_up.email, sign_up.role);

    let cookie = create_session_cookie(&session.id.to_string());
    Ok(HttpResponse::Created().cookie(cookie).json(ApiResponse::success(
        session_response(&session, state),
        "Registration successful",
    )))
}
