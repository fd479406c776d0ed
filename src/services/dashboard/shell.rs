use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::dashboard::build_shell;
use crate::errors::{PortalError, Result};
use crate::models::{ApiResponse, dashboard::ShellView};
use crate::services::session_from;
use crate::session::PortalSession;

fn shell_of(session: &PortalSession) -> Result<ShellView> {
    let state = session.provider.state();
    let identity = state
        .identity
        .as_ref()
        .ok_or_else(|| PortalError::authentication("Not signed in"))?;
    Ok(build_shell(identity, state.profile.as_ref(), session.nav()))
}

pub async fn handle_get_shell(request: &HttpRequest) -> ActixResult<HttpResponse> {
    match session_from(request).and_then(|session| shell_of(&session)) {
        Ok(shell) => Ok(HttpResponse::Ok().json(ApiResponse::success(shell, "Shell loaded"))),
        Err(e) => Ok(ApiResponse::from_error(&e)),
    }
}

pub async fn handle_toggle_nav(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let session = match session_from(request) {
        Ok(session) => session,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };
    let nav = session.toggle_nav();
    tracing::debug!("Session {} navigation open: {}", session.id, nav.open);

    match shell_of(&session) {
        Ok(shell) => Ok(HttpResponse::Ok().json(ApiResponse::success(shell, "Navigation toggled"))),
        Err(e) => Ok(ApiResponse::from_error(&e)),
    }
}
