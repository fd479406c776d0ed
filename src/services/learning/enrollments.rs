use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use crate::errors::{PortalError, Result};
use crate::models::{ApiResponse, enrollments::EnrollStudentRequest, profiles::UserRole};
use crate::services::client_from;

pub async fn handle_list(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let (session, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };
    let student_id = session.provider.state().identity.map(|i| i.id);

    let enrollments = client.student_enrollments(student_id).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(enrollments, "Enrollments loaded")))
}

// 学生为自己选课；替他人选课需要教务或管理员
fn enrollment_target(role: Option<UserRole>, me: Uuid, requested: Option<Uuid>) -> Result<Uuid> {
    match requested {
        Some(student) if student != me => {
            if role.is_some_and(|r| UserRole::staff_roles().contains(&&r)) {
                Ok(student)
            } else {
                Err(PortalError::authorization(
                    "Only academic staff can enroll other students",
                ))
            }
        }
        _ if role == Some(UserRole::Student) => Ok(me),
        _ => Err(PortalError::authorization("Only students can enroll themselves")),
    }
}

pub async fn handle_enroll(
    enroll: EnrollStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (session, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };
    let state = session.provider.state();
    let Some(me) = state.identity.map(|i| i.id) else {
        return Ok(ApiResponse::from_error(&PortalError::authentication(
            "Not signed in",
        )));
    };
    let student_id = match enrollment_target(state.profile.map(|p| p.role), me, enroll.student_id) {
        Ok(id) => id,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };

    match client.enroll_student(student_id, enroll.course_id).await {
        Ok(enrollment) => Ok(HttpResponse::Created()
            .json(ApiResponse::success(enrollment, "Enrolled in course"))),
        Err(e) => Ok(ApiResponse::from_error(&e)),
    }
}
