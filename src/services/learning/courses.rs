use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use crate::errors::{PortalError, Result};
use crate::models::{
    ApiResponse,
    courses::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest},
};
use crate::services::client_from;
use crate::utils::validate::{validate_course_update, validate_new_course};

const SELF_INSTRUCTOR: &str = "me";

// `me` 解析为当前身份
fn instructor_filter(query: &CourseListQuery, me: Option<Uuid>) -> Result<Option<Option<Uuid>>> {
    match query.instructor.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(SELF_INSTRUCTOR) => Ok(Some(me)),
        Some(raw) => raw
            .parse::<Uuid>()
            .map(|id| Some(Some(id)))
            .map_err(|_| PortalError::validation(format!("Invalid instructor id: {raw}"))),
    }
}

pub async fn handle_list(query: CourseListQuery, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let (session, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };
    let me = session.provider.state().identity.map(|i| i.id);

    let courses = match instructor_filter(&query, me) {
        Ok(Some(instructor)) => client.instructor_courses(instructor).await,
        Ok(None) => client.active_courses().await,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success(courses, "Courses loaded")))
}

pub async fn handle_create(
    create: CreateCourseRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(e) = validate_new_course(&create) {
        return Ok(ApiResponse::from_error(&e));
    }
    let (_, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };

    match client.create_course(&create).await {
        Ok(course) => {
            Ok(HttpResponse::Created().json(ApiResponse::success(course, "Course created")))
        }
        Err(e) => Ok(ApiResponse::from_error(&e)),
    }
}

pub async fn handle_update(
    course_id: Uuid,
    update: UpdateCourseRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if let Err(e) = validate_course_update(&update) {
        return Ok(ApiResponse::from_error(&e));
    }
    let (_, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };

    match client.update_course(course_id, &update).await {
        Ok(course) => Ok(HttpResponse::Ok().json(ApiResponse::success(course, "Course updated"))),
        Err(e) => Ok(ApiResponse::from_error(&e)),
    }
}

// 课程资料，最新上传的在前
pub async fn handle_materials(course_id: Uuid, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let (_, client) = match client_from(request).await {
        Ok(pair) => pair,
        Err(e) => return Ok(ApiResponse::from_error(&e)),
    };

    let materials = client.course_materials(Some(course_id)).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(materials, "Course materials loaded")))
}
