use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use crate::errors::PortalError;
use crate::models::ApiResponse;
use crate::models::submissions::{GradeSubmissionRequest, SubmitAssignmentRequest};
use crate::services::client_from;

pub async fn handle_submit(
    submit: SubmitAssignmentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (session, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };
    let Some(student_id) = session.provider.state().identity.map(|i| i.id) else {
        return Ok(ApiResponse::from_error(&PortalError::authentication(
            "Not signed in",
        )));
    };

    match client.submit_assignment(student_id, &submit).await {
        Ok(submission) => Ok(HttpResponse::Created()
            .json(ApiResponse::success(submission, "Assignment submitted"))),
        Err(e) => Ok(ApiResponse::from_error(&e)),
    }
}

pub async fn handle_grade(
    submission_id: Uuid,
    grade: GradeSubmissionRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let (_, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };

    match client.grade_submission(submission_id, &grade).await {
        Ok(submission) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(submission, "Submission graded")))
        }
        Err(e) => Ok(ApiResponse::from_error(&e)),
    }
}
