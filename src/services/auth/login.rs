use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::errors::PortalError;
use crate::models::{ApiResponse, auth::SignInRequest};
use crate::utils::session_cookie::{create_session_cookie, extract_session_id};
use crate::utils::validate::validate_email;

use super::{AuthService, session_response};

pub async fn handle_login(
    service: &AuthService,
    sign_in: SignInRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 1. 基本格式校验，不把明显无效的请求发给身份服务
    if let Err(msg) = validate_email(&sign_in.email) {
        return Ok(ApiResponse::from_error(&PortalError::validation(msg)));
    }
    if sign_in.password.is_empty() {
        return Ok(ApiResponse::from_error(&PortalError::validation(
            "Password must not be empty",
        )));
    }

    let registry = match service.get_registry(request) {
        Ok(registry) => registry,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };

    // 2. 每次登录都换一个新的浏览器会话
    let session = registry.create().await;
    match session.provider.sign_in(&sign_in.email, &sign_in.password).await {
        Ok(state) => {
            if let Some(previous) = extract_session_id(request) {
                registry.remove(&previous).await;
            }
            tracing::info!("User {} logged in", sign_in.email);

            let cookie = create_session_cookie(&session.id.to_string());
            Ok(HttpResponse::Ok().cookie(cookie).json(ApiResponse::success(
                session_response(&session, state),
                "Login successful",
            )))
        }
        Err(e) => {
            registry.remove(&session.id).await;
            Ok(ApiResponse::from_error(&e))
        }
    }
}
