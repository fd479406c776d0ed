pub mod assignments;
pub mod courses;
pub mod enrollments;
pub mod submissions;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use uuid::Uuid;

use crate::models::assignments::CreateAssignmentRequest;
use crate::models::courses::{CourseListQuery, CreateCourseRequest, UpdateCourseRequest};
use crate::models::enrollments::EnrollStudentRequest;
use crate::models::submissions::{GradeSubmissionRequest, SubmitAssignmentRequest};

pub struct LearningService;

impl LearningService {
    pub fn new_lazy() -> Self {
        Self
    }

    // 学生即将截止的作业
    pub async fn upcoming_assignments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        assignments::handle_upcoming(request).await
    }

    // 学生的选课
    pub async fn enrollments(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        enrollments::handle_list(request).await
    }

    // 课程目录或某教师的课程
    pub async fn courses(
        &self,
        query: CourseListQuery,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        courses::handle_list(query, request).await
    }

    // 新建课程
    pub async fn create_course(
        &self,
        create: CreateCourseRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        courses::handle_create(create, request).await
    }

    // 修改课程
    pub async fn update_course(
        &self,
        course_id: Uuid,
        update: UpdateCourseRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        courses::handle_update(course_id, update, request).await
    }

    pub async fn materials(&self, course_id: Uuid, request: &HttpRequest) -> ActixResult<HttpResponse> {
        courses::handle_materials(course_id, request).await
    }

    // 选课
    pub async fn enroll(
        &self,
        enroll: EnrollStudentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        enrollments::handle_enroll(enroll, request).await
    }

    // 布置作业
    pub async fn create_assignment(
        &self,
        create: CreateAssignmentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        assignments::handle_create(create, request).await
    }

    // 提交作业
    pub async fn submit(
        &self,
        submit: SubmitAssignmentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        submissions::handle_submit(submit, request).await
    }

    // 批改
    pub async fn grade(
        &self,
        submission_id: Uuid,
        grade: GradeSubmissionRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        submissions::handle_grade(submission_id, grade, request).await
    }
}
