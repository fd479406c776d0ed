use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;

use crate::models::{ApiResponse, assignments::CreateAssignmentRequest, profiles::UserRole};
use crate::services::client_from;
use crate::utils::validate::validate_new_assignment;

pub async fn handle_upcoming(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let (session, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };
    let student_id = session.provider.state().identity.map(|i| i.id);

    let upcoming = client.upcoming_assignments(student_id, Utc::now()).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(upcoming, "Upcoming assignments loaded")))
}

// 教师只能给自己的课程布置作业，管理员不受限
pub async fn handle_create(
    create: CreateAssignmentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(e) = validate_new_assignment(&create) {
        return Ok(ApiResponse::from_error(&e));
    }
    let (session, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };
    let state = session.provider.state();
    let instructor = match state.profile.map(|p| p.role) {
        Some(UserRole::Admin) => None,
        _ => state.identity.map(|i| i.id),
    };

    match client.create_assignment(&create, instructor).await {
        Ok(assignment) => Ok(HttpResponse::Created()
            .json(ApiResponse::success(assignment, "Assignment created"))),
        Err(e) => Ok(ApiResponse::from_error(&e)),
    }
}
