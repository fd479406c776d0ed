use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use crate::dashboard::build_dashboard;
use crate::models::ApiResponse;
use crate::services::client_from;

pub async fn handle_get_dashboard(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let (session, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };

    let state = session.provider.state();
    let view = build_dashboard(&client, &state, Utc::now()).await;
    tracing::debug!("Built {:?} dashboard for session {}", view.kind(), session.id);

    Ok(HttpResponse::Ok().json(ApiResponse::success(view, "Dashboard loaded")))
}
