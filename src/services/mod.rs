pub mod auth;
pub mod dashboard;
pub mod learning;

pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use learning::LearningService;

use actix_web::{HttpRequest, web};
use std::sync::Arc;

use crate::cache::ObjectCache;
use crate::errors::{PortalError, Result};
use crate::middlewares::RequireSession;
use crate::queries::QueryClient;
use crate::session::{PortalSession, SessionRegistry};

pub(crate) fn registry_from(request: &HttpRequest) -> Result<web::Data<SessionRegistry>> {
    request
        .app_data::<web::Data<SessionRegistry>>()
        .cloned()
        .ok_or_else(|| PortalError::backend_config("Session registry not found in app data"))
}

pub(crate) fn cache_from(request: &HttpRequest) -> Result<Arc<dyn ObjectCache>> {
    request
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|cache| cache.get_ref().clone())
        .ok_or_else(|| PortalError::cache_connection("Cache not found in app data"))
}

/// 由 RequireSession 放入请求扩展的会话
pub(crate) fn session_from(request: &HttpRequest) -> Result<Arc<PortalSession>> {
    RequireSession::extract_session(request)
        .ok_or_else(|| PortalError::authentication("Not signed in"))
}

/// 当前会话身份下的查询客户端
pub(crate) async fn client_from(
    request: &HttpRequest,
) -> Result<(Arc<PortalSession>, QueryClient)> {
    let session = session_from(request)?;
    let client = QueryClient::for_session(cache_from(request)?, &session).await;
    Ok((session, client))
}
