//! 进程内后端
//!
//! 开发模式与测试使用。身份部分签发与托管服务同形的 HS256 令牌，
//! 表部分以 `Vec` 存放行，联表在读取时拼装。

mod seed;

use std::sync::{
    RwLock, RwLockReadGuard, RwLockWriteGuard,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::{Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::{Backend, SignUpOutcome, SubmissionFilter};
use crate::errors::{PortalError, Result};
use crate::models::{
    assignments::{Assignment, AssignmentWithCourse, CreateAssignmentRequest},
    auth::{AuthSession, Identity},
    campus::{
        Announcement, Attendance, CourseMaterial, Department, Exam, ExamResult, Message, Payment,
        Schedule, SystemSetting,
    },
    courses::{Course, CourseFilter, CourseSummary, CreateCourseRequest, UpdateCourseRequest},
    enrollments::{Enrollment, EnrollmentWithCourse, NewEnrollment},
    profiles::{NewProfile, Profile, UpdateProfileRequest, UserRole},
    submissions::{AssignmentStatus, AssignmentSubmission, GradeUpdate, NewSubmission},
};
use crate::utils::{
    jwt::JwtUtils,
    password::{hash_password, verify_password},
    random_token,
};

pub use seed::DEMO_PASSWORD;

const DEFAULT_ACCESS_TTL_SECS: i64 = 3600;
const REFRESH_TOKEN_LENGTH: usize = 40;
const ROW_NOT_FOUND_MESSAGE: &str = "JSON object requested, multiple (or no) rows returned";

struct StoredIdentity {
    identity: Identity,
    password_hash: String,
}

#[derive(Clone)]
struct RefreshGrant {
    identity_id: Uuid,
    session_id: String,
}

/// 各表的行
#[derive(Default)]
pub struct Tables {
    pub profiles: Vec<Profile>,
    pub departments: Vec<Department>,
    pub courses: Vec<Course>,
    pub enrollments: Vec<Enrollment>,
    pub assignments: Vec<Assignment>,
    pub submissions: Vec<AssignmentSubmission>,
    pub announcements: Vec<Announcement>,
    pub attendance: Vec<Attendance>,
    pub exams: Vec<Exam>,
    pub exam_results: Vec<ExamResult>,
    pub payments: Vec<Payment>,
    pub schedules: Vec<Schedule>,
    pub materials: Vec<CourseMaterial>,
    pub messages: Vec<Message>,
    pub settings: Vec<SystemSetting>,
}

impl Tables {
    fn course_summary(&self, course_id: Uuid) -> Option<CourseSummary> {
        self.courses
            .iter()
            .find(|c| c.id == course_id)
            .map(CourseSummary::from)
    }

    fn with_course(&self, assignment: &Assignment) -> AssignmentWithCourse {
        AssignmentWithCourse {
            assignment: assignment.clone(),
            course: self.course_summary(assignment.course_id),
        }
    }
}

pub struct MemoryBackend {
    jwt: JwtUtils,
    access_ttl: Duration,
    identities: DashMap<Uuid, StoredIdentity>,
    refresh_tokens: DashMap<String, RefreshGrant>,
    revoked_sessions: DashMap<String, ()>,
    tables: RwLock<Tables>,
    reads: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            jwt: JwtUtils::new(jwt_secret),
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            identities: DashMap::new(),
            refresh_tokens: DashMap::new(),
            revoked_sessions: DashMap::new(),
            tables: RwLock::new(Tables::default()),
            reads: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// 带演示数据的实例，四个角色各一个账号，密码均为 [`DEMO_PASSWORD`]
    pub fn with_demo_data(jwt_secret: &str) -> Result<Self> {
        let backend = Self::new(jwt_secret);
        seed::populate(&backend)?;
        info!(
            "Memory backend seeded with demo accounts: {}",
            seed::DEMO_ACCOUNTS
                .iter()
                .map(|(email, _, _)| *email)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(backend)
    }

    /// access token 有效期
    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// 表读取次数
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// 模拟后端不可用：此后所有调用返回请求错误
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// 直接修改表数据
    pub fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        f(&mut self.write())
    }

    /// 创建身份并写入资料行
    pub fn add_account(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        role: UserRole,
    ) -> Result<Profile> {
        let identity = self.create_identity(email, password)?;
        let now = Utc::now();
        let profile = Profile {
            id: identity.id,
            email: email.to_string(),
            full_name: full_name.to_string(),
            role,
            student_id: None,
            employee_id: None,
            phone: None,
            address: None,
            date_of_birth: None,
            avatar_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.write().profiles.push(profile.clone());
        Ok(profile)
    }

    /// 只创建身份，不写资料（模拟注册后资料写入失败）
    pub fn add_identity(&self, email: &str, password: &str) -> Result<Identity> {
        self.create_identity(email, password)
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|p| p.into_inner())
    }

    fn ensure_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortalError::backend_request("Backend is unavailable"));
        }
        Ok(())
    }

    fn find_by_email(&self, email: &str) -> Option<Uuid> {
        self.identities
            .iter()
            .find(|entry| {
                entry
                    .identity
                    .email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .map(|entry| *entry.key())
    }

    fn create_identity(&self, email: &str, password: &str) -> Result<Identity> {
        if self.find_by_email(email).is_some() {
            return Err(PortalError::authentication("User already registered"));
        }
        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            email: Some(email.to_lowercase()),
            email_confirmed_at: Some(now),
            created_at: Some(now),
        };
        self.identities.insert(
            identity.id,
            StoredIdentity {
                identity: identity.clone(),
                password_hash: hash_password(password)?,
            },
        );
        Ok(identity)
    }

    fn issue_session(&self, identity: &Identity, session_id: &str) -> Result<AuthSession> {
        let (access_token, expires_at) = self
            .jwt
            .issue_access_token(
                identity.id,
                identity.email.as_deref().unwrap_or_default(),
                session_id,
                self.access_ttl,
            )
            .map_err(|e| PortalError::backend_response(format!("Failed to issue token: {e}")))?;
        let refresh_token = random_token(REFRESH_TOKEN_LENGTH);
        self.refresh_tokens.insert(
            refresh_token.clone(),
            RefreshGrant {
                identity_id: identity.id,
                session_id: session_id.to_string(),
            },
        );
        Ok(AuthSession {
            access_token,
            refresh_token,
            expires_at,
            user: identity.clone(),
        })
    }

    /// 校验 access token，返回身份ID
    fn authorize(&self, token: &str) -> Result<Uuid> {
        self.ensure_available()?;
        let claims = self
            .jwt
            .verify_access_token(token)
            .map_err(|e| PortalError::authentication(format!("Invalid access token: {e}")))?;
        if self.revoked_sessions.contains_key(&claims.session_id) {
            return Err(PortalError::authentication("Session has been signed out"));
        }
        claims
            .identity_id()
            .ok_or_else(|| PortalError::authentication("Invalid token subject"))
    }

    fn begin_read(&self, token: &str) -> Result<Uuid> {
        let caller = self.authorize(token)?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(caller)
    }
}

fn row_not_found() -> PortalError {
    PortalError::row_not_found(ROW_NOT_FOUND_MESSAGE)
}

#[async_trait::async_trait]
impl Backend for MemoryBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        self.ensure_available()?;
        let identity = self.create_identity(email, password)?;
        let session = self.issue_session(&identity, &Uuid::new_v4().to_string())?;
        debug!("Memory backend registered identity {}", identity.id);
        Ok(SignUpOutcome {
            identity,
            session: Some(session),
        })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.ensure_available()?;
        let invalid = || PortalError::authentication("Invalid login credentials");
        let id = self.find_by_email(email).ok_or_else(invalid)?;
        let identity = {
            let stored = self.identities.get(&id).ok_or_else(invalid)?;
            if !verify_password(password, &stored.password_hash) {
                return Err(invalid());
            }
            stored.identity.clone()
        };
        self.issue_session(&identity, &Uuid::new_v4().to_string())
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.ensure_available()?;
        let claims = self
            .jwt
            .verify_access_token(access_token)
            .map_err(|e| PortalError::authentication(format!("Invalid access token: {e}")))?;
        self.refresh_tokens
            .retain(|_, grant| grant.session_id != claims.session_id);
        self.revoked_sessions.insert(claims.session_id, ());
        Ok(())
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession> {
        self.ensure_available()?;
        // refresh token 一次性使用
        let (_, grant) = self
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| PortalError::authentication("Invalid Refresh Token"))?;
        if self.revoked_sessions.contains_key(&grant.session_id) {
            return Err(PortalError::authentication("Session has been signed out"));
        }
        let identity = self
            .identities
            .get(&grant.identity_id)
            .map(|stored| stored.identity.clone())
            .ok_or_else(|| PortalError::authentication("User not found"))?;
        self.issue_session(&identity, &grant.session_id)
    }

    async fn get_identity(&self, access_token: &str) -> Result<Identity> {
        let id = self.authorize(access_token)?;
        self.identities
            .get(&id)
            .map(|stored| stored.identity.clone())
            .ok_or_else(|| PortalError::authentication("User not found"))
    }

    async fn get_profile(&self, token: &str, id: Uuid) -> Result<Profile> {
        self.begin_read(token)?;
        self.read()
            .profiles
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(row_not_found)
    }

    async fn insert_profile(&self, token: &str, profile: NewProfile) -> Result<Profile> {
        // 未确认邮箱时注册流程没有会话，允许以匿名身份写入自己的资料行
        if token.is_empty() {
            self.ensure_available()?;
            if !self.identities.contains_key(&profile.id) {
                return Err(PortalError::authorization(
                    "Profile id does not match a registered identity",
                ));
            }
        } else if self.authorize(token)? != profile.id {
            return Err(PortalError::authorization(
                "Cannot create a profile for another user",
            ));
        }

        let mut tables = self.write();
        if tables.profiles.iter().any(|p| p.id == profile.id) {
            return Err(PortalError::validation("Profile already exists"));
        }
        let now = Utc::now();
        let row = Profile {
            id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            role: profile.role,
            student_id: profile.student_id,
            employee_id: profile.employee_id,
            phone: profile.phone,
            address: None,
            date_of_birth: None,
            avatar_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.profiles.push(row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        token: &str,
        id: Uuid,
        update: &UpdateProfileRequest,
    ) -> Result<Profile> {
        self.authorize(token)?;
        let mut tables = self.write();
        let profile = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(row_not_found)?;
        if let Some(ref name) = update.full_name {
            profile.full_name = name.clone();
        }
        if let Some(ref phone) = update.phone {
            profile.phone = Some(phone.clone());
        }
        if let Some(ref address) = update.address {
            profile.address = Some(address.clone());
        }
        if let Some(dob) = update.date_of_birth {
            profile.date_of_birth = Some(dob);
        }
        if let Some(ref avatar) = update.avatar_url {
            profile.avatar_url = Some(avatar.clone());
        }
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn list_profiles(&self, token: &str) -> Result<Vec<Profile>> {
        self.begin_read(token)?;
        let mut profiles = self.read().profiles.clone();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }

    async fn list_courses(&self, token: &str, filter: &CourseFilter) -> Result<Vec<Course>> {
        self.begin_read(token)?;
        let mut courses: Vec<Course> = self
            .read()
            .courses
            .iter()
            .filter(|c| filter.instructor_id.is_none_or(|id| c.instructor_id == Some(id)))
            .filter(|c| !filter.active_only || c.is_active)
            .cloned()
            .collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(courses)
    }

    async fn get_course(&self, token: &str, id: Uuid) -> Result<Course> {
        self.begin_read(token)?;
        self.read()
            .courses
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(row_not_found)
    }

    async fn insert_course(&self, token: &str, course: &CreateCourseRequest) -> Result<Course> {
        self.authorize(token)?;
        let mut tables = self.write();
        if tables
            .courses
            .iter()
            .any(|c| c.code.eq_ignore_ascii_case(&course.code))
        {
            return Err(PortalError::validation(format!(
                "Course code {} already exists",
                course.code
            )));
        }
        let row = Course {
            id: Uuid::new_v4(),
            name: course.name.clone(),
            code: course.code.clone(),
            description: course.description.clone(),
            credits: course.credits,
            semester: course.semester.clone(),
            academic_year: course.academic_year.clone(),
            department_id: course.department_id,
            instructor_id: course.instructor_id,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.courses.push(row.clone());
        Ok(row)
    }

    async fn update_course(
        &self,
        token: &str,
        id: Uuid,
        update: &UpdateCourseRequest,
    ) -> Result<Course> {
        self.authorize(token)?;
        let mut tables = self.write();
        if let Some(ref code) = update.code {
            if tables
                .courses
                .iter()
                .any(|c| c.id != id && c.code.eq_ignore_ascii_case(code))
            {
                return Err(PortalError::validation(format!(
                    "Course code {code} already exists"
                )));
            }
        }
        let course = tables
            .courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(row_not_found)?;
        if let Some(ref name) = update.name {
            course.name = name.clone();
        }
        if let Some(ref code) = update.code {
            course.code = code.clone();
        }
        if let Some(ref description) = update.description {
            course.description = Some(description.clone());
        }
        if let Some(credits) = update.credits {
            course.credits = credits;
        }
        if let Some(ref semester) = update.semester {
            course.semester = semester.clone();
        }
        if let Some(ref year) = update.academic_year {
            course.academic_year = year.clone();
        }
        if let Some(department) = update.department_id {
            course.department_id = Some(department);
        }
        if let Some(instructor) = update.instructor_id {
            course.instructor_id = Some(instructor);
        }
        if let Some(active) = update.is_active {
            course.is_active = active;
        }
        Ok(course.clone())
    }

    async fn list_student_enrollments(
        &self,
        token: &str,
        student_id: Uuid,
    ) -> Result<Vec<EnrollmentWithCourse>> {
        self.begin_read(token)?;
        let tables = self.read();
        let mut enrollments: Vec<EnrollmentWithCourse> = tables
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id && e.is_active)
            .map(|e| EnrollmentWithCourse {
                enrollment: e.clone(),
                course: tables.courses.iter().find(|c| c.id == e.course_id).cloned(),
            })
            .collect();
        enrollments.sort_by(|a, b| b.enrollment.enrollment_date.cmp(&a.enrollment.enrollment_date));
        Ok(enrollments)
    }

    async fn list_course_enrollments(
        &self,
        token: &str,
        course_id: Uuid,
    ) -> Result<Vec<Enrollment>> {
        self.begin_read(token)?;
        Ok(self
            .read()
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id && e.is_active)
            .cloned()
            .collect())
    }

    async fn insert_enrollment(&self, token: &str, enrollment: NewEnrollment) -> Result<Enrollment> {
        self.authorize(token)?;
        let mut tables = self.write();
        if !tables.courses.iter().any(|c| c.id == enrollment.course_id) {
            return Err(PortalError::validation(
                "Enrollment references an unknown course",
            ));
        }
        if tables.enrollments.iter().any(|e| {
            e.student_id == enrollment.student_id && e.course_id == enrollment.course_id && e.is_active
        }) {
            return Err(PortalError::validation(
                "Student is already enrolled in this course",
            ));
        }
        let row = Enrollment {
            id: Uuid::new_v4(),
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            enrollment_date: Utc::now(),
            is_active: true,
        };
        tables.enrollments.push(row.clone());
        Ok(row)
    }

    async fn list_student_assignments(
        &self,
        token: &str,
        student_id: Uuid,
    ) -> Result<Vec<AssignmentWithCourse>> {
        self.begin_read(token)?;
        let tables = self.read();
        let enrolled: Vec<Uuid> = tables
            .enrollments
            .iter()
            .filter(|e| e.student_id == student_id && e.is_active)
            .map(|e| e.course_id)
            .collect();
        let mut assignments: Vec<AssignmentWithCourse> = tables
            .assignments
            .iter()
            .filter(|a| a.is_active && enrolled.contains(&a.course_id))
            .map(|a| tables.with_course(a))
            .collect();
        assignments.sort_by_key(|a| a.assignment.due_date);
        Ok(assignments)
    }

    async fn list_course_assignments(
        &self,
        token: &str,
        course_ids: &[Uuid],
    ) -> Result<Vec<AssignmentWithCourse>> {
        self.begin_read(token)?;
        let tables = self.read();
        let mut assignments: Vec<AssignmentWithCourse> = tables
            .assignments
            .iter()
            .filter(|a| a.is_active && course_ids.contains(&a.course_id))
            .map(|a| tables.with_course(a))
            .collect();
        assignments.sort_by_key(|a| a.assignment.due_date);
        Ok(assignments)
    }

    async fn get_assignment(&self, token: &str, id: Uuid) -> Result<Assignment> {
        self.begin_read(token)?;
        self.read()
            .assignments
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(row_not_found)
    }

    async fn insert_assignment(
        &self,
        token: &str,
        assignment: &CreateAssignmentRequest,
    ) -> Result<Assignment> {
        self.authorize(token)?;
        let mut tables = self.write();
        if !tables.courses.iter().any(|c| c.id == assignment.course_id) {
            return Err(PortalError::validation(
                "Assignment references an unknown course",
            ));
        }
        let row = Assignment {
            id: Uuid::new_v4(),
            course_id: assignment.course_id,
            title: assignment.title.clone(),
            description: assignment.description.clone(),
            due_date: assignment.due_date,
            max_points: assignment.max_points,
            is_active: true,
            created_at: Utc::now(),
        };
        tables.assignments.push(row.clone());
        Ok(row)
    }

    async fn list_submissions(
        &self,
        token: &str,
        filter: &SubmissionFilter,
    ) -> Result<Vec<AssignmentSubmission>> {
        self.begin_read(token)?;
        let mut submissions: Vec<AssignmentSubmission> = self
            .read()
            .submissions
            .iter()
            .filter(|s| {
                filter.assignment_ids.is_empty() || filter.assignment_ids.contains(&s.assignment_id)
            })
            .filter(|s| filter.student_id.is_none_or(|id| s.student_id == id))
            .cloned()
            .collect();
        submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(submissions)
    }

    async fn get_submission(&self, token: &str, id: Uuid) -> Result<AssignmentSubmission> {
        self.begin_read(token)?;
        self.read()
            .submissions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(row_not_found)
    }

    async fn insert_submission(
        &self,
        token: &str,
        submission: NewSubmission,
    ) -> Result<AssignmentSubmission> {
        self.authorize(token)?;
        let mut tables = self.write();
        if !tables
            .assignments
            .iter()
            .any(|a| a.id == submission.assignment_id)
        {
            return Err(PortalError::validation(
                "Submission references an unknown assignment",
            ));
        }
        let row = AssignmentSubmission {
            id: Uuid::new_v4(),
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            status: submission.status,
            content: submission.content,
            points_earned: None,
            feedback: None,
            submitted_at: Some(submission.submitted_at),
            graded_at: None,
        };
        tables.submissions.push(row.clone());
        Ok(row)
    }

    async fn update_submission(
        &self,
        token: &str,
        id: Uuid,
        update: &GradeUpdate,
    ) -> Result<AssignmentSubmission> {
        self.authorize(token)?;
        let mut tables = self.write();
        let submission = tables
            .submissions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(row_not_found)?;
        submission.status = update.status;
        submission.points_earned = Some(update.points_earned);
        if update.feedback.is_some() {
            submission.feedback = update.feedback.clone();
        }
        submission.graded_at = Some(update.graded_at);
        Ok(submission.clone())
    }

    async fn list_announcements(
        &self,
        token: &str,
        role: Option<UserRole>,
        limit: usize,
    ) -> Result<Vec<Announcement>> {
        self.begin_read(token)?;
        let mut announcements: Vec<Announcement> = self
            .read()
            .announcements
            .iter()
            .filter(|a| a.target_role.is_none() || (role.is_some() && a.target_role == role))
            .cloned()
            .collect();
        announcements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        announcements.truncate(limit);
        Ok(announcements)
    }

    async fn list_attendance(&self, token: &str, student_id: Uuid) -> Result<Vec<Attendance>> {
        self.begin_read(token)?;
        let mut records: Vec<Attendance> = self
            .read()
            .attendance
            .iter()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn list_exam_results(&self, token: &str, student_id: Uuid) -> Result<Vec<ExamResult>> {
        self.begin_read(token)?;
        let tables = self.read();
        Ok(tables
            .exam_results
            .iter()
            .filter(|r| r.student_id == student_id)
            .map(|r| ExamResult {
                exam: tables.exams.iter().find(|e| e.id == r.exam_id).cloned(),
                ..r.clone()
            })
            .collect())
    }

    async fn list_payments(&self, token: &str, student_id: Uuid) -> Result<Vec<Payment>> {
        self.begin_read(token)?;
        let mut payments: Vec<Payment> = self
            .read()
            .payments
            .iter()
            .filter(|p| p.student_id == student_id)
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.due_date);
        Ok(payments)
    }

    async fn list_departments(&self, token: &str) -> Result<Vec<Department>> {
        self.begin_read(token)?;
        let mut departments = self.read().departments.clone();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn list_schedules(&self, token: &str, course_ids: &[Uuid]) -> Result<Vec<Schedule>> {
        self.begin_read(token)?;
        let mut schedules: Vec<Schedule> = self
            .read()
            .schedules
            .iter()
            .filter(|s| course_ids.contains(&s.course_id))
            .cloned()
            .collect();
        schedules.sort_by_key(|s| (s.day_of_week, s.start_time));
        Ok(schedules)
    }

    async fn list_course_materials(
        &self,
        token: &str,
        course_id: Uuid,
    ) -> Result<Vec<CourseMaterial>> {
        self.begin_read(token)?;
        let mut materials: Vec<CourseMaterial> = self
            .read()
            .materials
            .iter()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        materials.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(materials)
    }

    async fn list_unread_messages(&self, token: &str, recipient_id: Uuid) -> Result<Vec<Message>> {
        self.begin_read(token)?;
        let mut messages: Vec<Message> = self
            .read()
            .messages
            .iter()
            .filter(|m| m.recipient_id == recipient_id && !m.is_read)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    async fn list_system_settings(&self, token: &str) -> Result<Vec<SystemSetting>> {
        self.begin_read(token)?;
        let mut settings = self.read().settings.clone();
        settings.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "memory-backend-test-secret";

    #[tokio::test]
    async fn test_sign_in_and_read_own_profile() {
        let backend = MemoryBackend::new(SECRET);
        let profile = backend
            .add_account("ada@campus.test", "Lovelace1815", "Ada Lovelace", UserRole::Student)
            .unwrap();

        let session = backend
            .sign_in_with_password("ADA@campus.test", "Lovelace1815")
            .await
            .unwrap();
        assert_eq!(session.user.id, profile.id);

        let fetched = backend.get_profile(&session.access_token, profile.id).await.unwrap();
        assert_eq!(fetched.full_name, "Ada Lovelace");
        assert_eq!(backend.reads(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password_and_missing_profile() {
        let backend = MemoryBackend::new(SECRET);
        let identity = backend.add_identity("noprofile@campus.test", "Secret123").unwrap();

        let err = backend
            .sign_in_with_password("noprofile@campus.test", "wrong-pass1")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E012");

        let session = backend
            .sign_in_with_password("noprofile@campus.test", "Secret123")
            .await
            .unwrap();
        let err = backend
            .get_profile(&session.access_token, identity.id)
            .await
            .unwrap_err();
        assert!(err.is_row_not_found());
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_sign_out_revokes() {
        let backend = MemoryBackend::new(SECRET);
        backend
            .add_account("t@campus.test", "Teacher123", "T", UserRole::Teacher)
            .unwrap();
        let first = backend.sign_in_with_password("t@campus.test", "Teacher123").await.unwrap();

        let second = backend.refresh_session(&first.refresh_token).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        assert!(backend.refresh_session(&first.refresh_token).await.is_err());

        backend.sign_out(&second.access_token).await.unwrap();
        assert!(backend.get_identity(&second.access_token).await.is_err());
        assert!(backend.refresh_session(&second.refresh_token).await.is_err());
    }

    #[tokio::test]
    async fn test_announcements_visible_to_role() {
        let backend = MemoryBackend::with_demo_data(SECRET).unwrap();
        let session = backend
            .sign_in_with_password(seed::DEMO_ACCOUNTS[1].0, DEMO_PASSWORD)
            .await
            .unwrap();

        let announcements = backend
            .list_announcements(&session.access_token, Some(UserRole::Teacher), 10)
            .await
            .unwrap();
        assert!(!announcements.is_empty());
        assert!(announcements.iter().all(|a| {
            a.target_role.is_none() || a.target_role == Some(UserRole::Teacher)
        }));
        assert!(
            announcements
                .windows(2)
                .all(|w| w[0].created_at >= w[1].created_at)
        );
    }

    #[tokio::test]
    async fn test_unavailable_backend_fails_reads() {
        let backend = MemoryBackend::new(SECRET);
        backend
            .add_account("s@campus.test", "Student123", "S", UserRole::Student)
            .unwrap();
        let session = backend.sign_in_with_password("s@campus.test", "Student123").await.unwrap();

        backend.set_unavailable(true);
        let err = backend
            .list_departments(&session.access_token)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E004");
        assert!(backend.sign_out(&session.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_grade_update_marks_submission() {
        let backend = MemoryBackend::with_demo_data(SECRET).unwrap();
        let session = backend
            .sign_in_with_password(seed::DEMO_ACCOUNTS[1].0, DEMO_PASSWORD)
            .await
            .unwrap();
        let pending = backend.with_tables(|t| {
            t.submissions
                .iter()
                .find(|s| s.status == AssignmentStatus::Submitted)
                .map(|s| s.id)
        });
        let id = pending.expect("demo data has a submitted row");

        let graded = backend
            .update_submission(
                &session.access_token,
                id,
                &GradeUpdate {
                    status: AssignmentStatus::Graded,
                    points_earned: 9.0,
                    feedback: Some("Well argued".to_string()),
                    graded_at: Utc::now(),
                },
            )
            .await
            .unwrap();
        assert_eq!(graded.points_earned, Some(9.0));
        assert!(graded.graded_at.is_some());
    }

    #[tokio::test]
    async fn test_course_code_is_unique() {
        let backend = MemoryBackend::with_demo_data(SECRET).unwrap();
        let session = backend
            .sign_in_with_password(seed::DEMO_ACCOUNTS[2].0, DEMO_PASSWORD)
            .await
            .unwrap();
        let request = CreateCourseRequest {
            name: "Another Intro".to_string(),
            code: "cs101".to_string(),
            description: None,
            credits: 3,
            semester: "Spring".to_string(),
            academic_year: "2025-2026".to_string(),
            department_id: None,
            instructor_id: None,
        };
        let err = backend
            .insert_course(&session.access_token, &request)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        let err = backend
            .update_course(&session.access_token, Uuid::new_v4(), &UpdateCourseRequest {
                name: Some("Ghost".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_row_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_active_enrollment_is_rejected() {
        let backend = MemoryBackend::with_demo_data(SECRET).unwrap();
        let session = backend
            .sign_in_with_password(seed::DEMO_ACCOUNTS[0].0, DEMO_PASSWORD)
            .await
            .unwrap();
        let existing = backend
            .with_tables(|t| t.enrollments.first().cloned())
            .expect("demo data has enrollments");

        let err = backend
            .insert_enrollment(&session.access_token, NewEnrollment {
                student_id: existing.student_id,
                course_id: existing.course_id,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        let err = backend
            .insert_enrollment(&session.access_token, NewEnrollment {
                student_id: existing.student_id,
                course_id: Uuid::new_v4(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
    }
}
