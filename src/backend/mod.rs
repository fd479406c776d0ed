//! 托管后端客户端
//!
//! `Backend` 是应用与外部服务之间唯一的接口：身份调用和表读写。
//! 本应用不拥有任何数据，所有组合查询都交给后端的联表语法完成。

use std::sync::Arc;

use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::{PortalError, Result};
use crate::models::{
    assignments::{Assignment, AssignmentWithCourse, CreateAssignmentRequest},
    auth::{AuthSession, Identity},
    campus::{
        Announcement, Attendance, CourseMaterial, Department, ExamResult, Message, Payment,
        Schedule, SystemSetting,
    },
    courses::{Course, CourseFilter, CreateCourseRequest, UpdateCourseRequest},
    enrollments::{Enrollment, EnrollmentWithCourse, NewEnrollment},
    profiles::{NewProfile, Profile, UpdateProfileRequest, UserRole},
    submissions::{AssignmentSubmission, GradeUpdate, NewSubmission},
};

pub mod memory;
pub mod rest;

/// 注册结果：开启邮箱确认时后端不会立即返回会话
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub identity: Identity,
    pub session: Option<AuthSession>,
}

/// 提交记录筛选
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub assignment_ids: Vec<Uuid>,
    pub student_id: Option<Uuid>,
}

/// 表操作的 `token` 为调用者的 access token，空串表示匿名（使用 anon key）
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// 身份
    // 注册身份
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome>;
    // 密码登录
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession>;
    // 注销远端会话
    async fn sign_out(&self, access_token: &str) -> Result<()>;
    // 用 refresh token 换新会话
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession>;
    // 当前令牌对应的身份
    async fn get_identity(&self, access_token: &str) -> Result<Identity>;

    /// 用户资料
    // 按身份ID获取资料，不存在时返回 RowNotFound
    async fn get_profile(&self, token: &str, id: Uuid) -> Result<Profile>;
    async fn insert_profile(&self, token: &str, profile: NewProfile) -> Result<Profile>;
    async fn update_profile(
        &self,
        token: &str,
        id: Uuid,
        update: &UpdateProfileRequest,
    ) -> Result<Profile>;
    async fn list_profiles(&self, token: &str) -> Result<Vec<Profile>>;

    /// 课程与选课
    async fn list_courses(&self, token: &str, filter: &CourseFilter) -> Result<Vec<Course>>;
    async fn get_course(&self, token: &str, id: Uuid) -> Result<Course>;
    // 课程代码重复时返回 Validation
    async fn insert_course(&self, token: &str, course: &CreateCourseRequest) -> Result<Course>;
    async fn update_course(
        &self,
        token: &str,
        id: Uuid,
        update: &UpdateCourseRequest,
    ) -> Result<Course>;
    // 学生的有效选课，联表课程
    async fn list_student_enrollments(
        &self,
        token: &str,
        student_id: Uuid,
    ) -> Result<Vec<EnrollmentWithCourse>>;
    // 课程的有效选课名单
    async fn list_course_enrollments(&self, token: &str, course_id: Uuid)
    -> Result<Vec<Enrollment>>;
    // 已有有效选课时返回 Validation
    async fn insert_enrollment(&self, token: &str, enrollment: NewEnrollment) -> Result<Enrollment>;

    /// 作业与提交
    // 学生所选课程下的有效作业，按截止时间升序
    async fn list_student_assignments(
        &self,
        token: &str,
        student_id: Uuid,
    ) -> Result<Vec<AssignmentWithCourse>>;
    // 指定课程下的有效作业，按截止时间升序
    async fn list_course_assignments(
        &self,
        token: &str,
        course_ids: &[Uuid],
    ) -> Result<Vec<AssignmentWithCourse>>;
    async fn get_assignment(&self, token: &str, id: Uuid) -> Result<Assignment>;
    async fn insert_assignment(
        &self,
        token: &str,
        assignment: &CreateAssignmentRequest,
    ) -> Result<Assignment>;
    async fn list_submissions(
        &self,
        token: &str,
        filter: &SubmissionFilter,
    ) -> Result<Vec<AssignmentSubmission>>;
    async fn get_submission(&self, token: &str, id: Uuid) -> Result<AssignmentSubmission>;
    async fn insert_submission(
        &self,
        token: &str,
        submission: NewSubmission,
    ) -> Result<AssignmentSubmission>;
    async fn update_submission(
        &self,
        token: &str,
        id: Uuid,
        update: &GradeUpdate,
    ) -> Result<AssignmentSubmission>;

    /// 外围实体（仅展示）
    // 面向某角色（或全体）的最新公告
    async fn list_announcements(
        &self,
        token: &str,
        role: Option<UserRole>,
        limit: usize,
    ) -> Result<Vec<Announcement>>;
    async fn list_attendance(&self, token: &str, student_id: Uuid) -> Result<Vec<Attendance>>;
    async fn list_exam_results(&self, token: &str, student_id: Uuid) -> Result<Vec<ExamResult>>;
    async fn list_payments(&self, token: &str, student_id: Uuid) -> Result<Vec<Payment>>;
    async fn list_departments(&self, token: &str) -> Result<Vec<Department>>;
    async fn list_schedules(&self, token: &str, course_ids: &[Uuid]) -> Result<Vec<Schedule>>;
    async fn list_course_materials(
        &self,
        token: &str,
        course_id: Uuid,
    ) -> Result<Vec<CourseMaterial>>;
    async fn list_unread_messages(&self, token: &str, recipient_id: Uuid) -> Result<Vec<Message>>;
    async fn list_system_settings(&self, token: &str) -> Result<Vec<SystemSetting>>;
}

/// 根据配置创建后端
pub async fn create_backend() -> Result<Arc<dyn Backend>> {
    let config = AppConfig::get();
    match config.backend.kind.as_str() {
        "rest" => {
            let backend = rest::RestBackend::from_config(&config.backend)?;
            Ok(Arc::new(backend))
        }
        "memory" => {
            let backend = memory::MemoryBackend::with_demo_data(&config.backend.jwt_secret)?;
            Ok(Arc::new(backend))
        }
        other => Err(PortalError::backend_plugin_not_found(format!(
            "Unknown backend kind '{other}', expected 'rest' or 'memory'"
        ))),
    }
}
