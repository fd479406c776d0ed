use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::middlewares::RequireRole;
use crate::models::assignments::CreateAssignmentRequest;
use crate::models::courses::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest};
use crate::models::enrollments::EnrollStudentRequest;
use crate::models::profiles::UserRole;
use crate::models::submissions::{GradeSubmissionRequest, SubmitAssignmentRequest};
use crate::services::LearningService;

// 懒加载的全局 LearningService 实例
static LEARNING_SERVICE: Lazy<LearningService> = Lazy::new(LearningService::new_lazy);

pub async fn upcoming_assignments(req: HttpRequest) -> ActixResult<HttpResponse> {
    LEARNING_SERVICE.upcoming_assignments(&req).await
}

pub async fn list_enrollments(req: HttpRequest) -> ActixResult<HttpResponse> {
    LEARNING_SERVICE.enrollments(&req).await
}

pub async fn list_courses(
    req: HttpRequest,
    query: web::Query<CourseListQuery>,
) -> ActixResult<HttpResponse> {
    LEARNING_SERVICE.courses(query.into_inner(), &req).await
}

pub async fn create_course(
    req: HttpRequest,
    create: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    LEARNING_SERVICE.create_course(create.into_inner(), &req).await
}

pub async fn update_course(
    req: HttpRequest,
    path: web::Path<Uuid>,
    update: web::Json<UpdateCourseRequest>,
) -> ActixResult<HttpResponse> {
    LEARNING_SERVICE
        .update_course(path.into_inner(), update.into_inner(), &req)
        .await
}

pub async fn course_materials(req: HttpRequest, path: web::Path<Uuid>) -> ActixResult<HttpResponse> {
    LEARNING_SERVICE.materials(path.into_inner(), &req).await
}

pub async fn enroll(
    req: HttpRequest,
    enroll: web::Json<EnrollStudentRequest>,
) -> ActixResult<HttpResponse> {
    LEARNING_SERVICE.enroll(enroll.into_inner(), &req).await
}

pub async fn create_assignment(
    req: HttpRequest,
    create: web::Json<CreateAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    LEARNING_SERVICE.create_assignment(create.into_inner(), &req).await
}

pub async fn submit_assignment(
    req: HttpRequest,
    submit: web::Json<SubmitAssignmentRequest>,
) -> ActixResult<HttpResponse> {
    LEARNING_SERVICE.submit(submit.into_inner(), &req).await
}

pub async fn grade_submission(
    req: HttpRequest,
    path: web::Path<Uuid>,
    grade: web::Json<GradeSubmissionRequest>,
) -> ActixResult<HttpResponse> {
    LEARNING_SERVICE
        .grade(path.into_inner(), grade.into_inner(), &req)
        .await
}

// 配置路由
pub fn configure_learning_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/assignments/upcoming", web::get().to(upcoming_assignments))
        .service(
            web::resource("/assignments")
                .wrap(RequireRole::new_any(UserRole::teacher_roles()))
                .route(web::post().to(create_assignment)),
        )
        .route("/enrollments", web::get().to(list_enrollments))
        .route("/enrollments", web::post().to(enroll))
        .route("/courses", web::get().to(list_courses))
        .service(
            web::resource("/courses")
                .wrap(RequireRole::new_any(UserRole::staff_roles()))
                .route(web::post().to(create_course)),
        )
        .service(
            web::resource("/courses/{id}")
                .wrap(RequireRole::new_any(UserRole::staff_roles()))
                .route(web::patch().to(update_course)),
        )
        .route("/courses/{id}/materials", web::get().to(course_materials))
        .route("/submissions", web::post().to(submit_assignment))
        .service(
            web::resource("/submissions/{id}/grade")
                .wrap(RequireRole::new_any(UserRole::teacher_roles()))
                .route(web::patch().to(grade_submission)),
        );
}
