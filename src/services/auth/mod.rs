pub mod login;
pub mod logout;
pub mod profile;
pub mod register;
pub mod session;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::dashboard::AuthGate;
use crate::errors::Result;
use crate::models::auth::{SessionResponse, SignInRequest, SignUpRequest};
use crate::models::profiles::UpdateProfileRequest;
use crate::session::{PortalSession, SessionRegistry, SessionState};

pub struct AuthService {
    registry: Option<web::Data<SessionRegistry>>,
}

impl AuthService {
    pub fn new_lazy() -> Self {
        Self { registry: None }
    }

    pub(crate) fn get_registry(&self, request: &HttpRequest) -> Result<web::Data<SessionRegistry>> {
        match &self.registry {
            Some(registry) => Ok(registry.clone()),
            None => super::registry_from(request),
        }
    }

    // 注册
    pub async fn register(
        &self,
        sign_up: SignUpRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        register::handle_register(self, sign_up, request).await
    }

    // 登录
    pub async fn login(
        &self,
        sign_in: SignInRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        login::handle_login(self, sign_in, request).await
    }

    // 登出
    pub async fn logout(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        logout::handle_logout(self, request).await
    }

    // 会话状态与闸门视图
    pub async fn session(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        session::handle_session(self, request).await
    }

    // 更新自己的资料
    pub async fn update_profile(
        &self,
        update: UpdateProfileRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        profile::handle_update_profile(update, request).await
    }
}

/// 会话状态响应，附带闸门视图
pub(crate) fn session_response(session: &PortalSession, state: SessionState) -> SessionResponse {
    let view = AuthGate::resolve(&state, session.nav());
    SessionResponse {
        identity: state.identity,
        profile: state.profile,
        loading: state.loading,
        view,
    }
}
