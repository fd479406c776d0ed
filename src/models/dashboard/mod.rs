//! 仪表盘视图模型，SPA 直接按字段渲染

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::models::assignments::AssignmentWithCourse;
use crate::models::campus::{
    Announcement, Department, ExamResult, Message, Payment, Schedule, SystemSetting,
};
use crate::models::courses::Course;
use crate::models::profiles::UserRole;
use crate::models::submissions::AssignmentSubmission;

// 导航项
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct NavItem {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
}

// 仪表盘种类
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub enum DashboardKind {
    Student,
    Teacher,
    AcademicStaff,
    Admin,
}

// 外壳：导航 + 当前应渲染的仪表盘
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct ShellView {
    pub role: UserRole,
    pub kind: DashboardKind,
    pub display_name: String,
    pub nav_open: bool,
    pub navigation: Vec<NavItem>,
}

// 认证闸门的结果
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(tag = "view", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub enum GateView {
    Loading,
    Login,
    Dashboard { shell: ShellView },
}

// 统计卡片
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct StatCard {
    pub label: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl StatCard {
    pub fn new(label: impl Into<String>, value: impl ToString) -> Self {
        Self {
            label: label.into(),
            value: value.to_string(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// 课程卡片
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct CourseCard {
    pub course_id: Uuid,
    pub name: String,
    pub code: String,
    pub credits: i32,
    pub semester: String,
}

impl From<&Course> for CourseCard {
    fn from(course: &Course) -> Self {
        Self {
            course_id: course.id,
            name: course.name.clone(),
            code: course.code.clone(),
            credits: course.credits,
            semester: course.semester.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct StudentDashboard {
    pub stats: Vec<StatCard>,
    pub courses: Vec<CourseCard>,
    pub upcoming_assignments: Vec<AssignmentWithCourse>,
    pub recent_grades: Vec<AssignmentSubmission>,
    pub exam_results: Vec<ExamResult>,
    pub outstanding_payments: Vec<Payment>,
    pub schedule: Vec<Schedule>,
    pub unread_messages: Vec<Message>,
    pub announcements: Vec<Announcement>,
}

// 教师视角的单个作业进度
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct AssignmentProgress {
    pub assignment_id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub due_date: chrono::DateTime<chrono::Utc>,
    pub submitted: usize,
    pub roster_size: usize,
    pub awaiting_grading: usize,
    pub all_submitted: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct TaughtCourse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub card: CourseCard,
    pub roster_size: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct TeacherDashboard {
    pub stats: Vec<StatCard>,
    pub courses: Vec<TaughtCourse>,
    pub assignments: Vec<AssignmentProgress>,
    pub schedule: Vec<Schedule>,
    pub unread_messages: Vec<Message>,
    pub announcements: Vec<Announcement>,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct DepartmentSummary {
    #[serde(flatten)]
    #[ts(flatten)]
    pub department: Department,
    pub active_courses: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct StaffDashboard {
    pub stats: Vec<StatCard>,
    pub departments: Vec<DepartmentSummary>,
    pub courses: Vec<CourseCard>,
    pub announcements: Vec<Announcement>,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct RoleCount {
    pub role: UserRole,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub struct AdminDashboard {
    pub stats: Vec<StatCard>,
    pub users_by_role: Vec<RoleCount>,
    pub settings: Vec<SystemSetting>,
    pub announcements: Vec<Announcement>,
}

// 按角色分派后的仪表盘
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/dashboard.ts")]
pub enum DashboardView {
    Student(StudentDashboard),
    Teacher(TeacherDashboard),
    AcademicStaff(StaffDashboard),
    Admin(AdminDashboard),
}

impl DashboardView {
    pub fn kind(&self) -> DashboardKind {
        match self {
            DashboardView::Student(_) => DashboardKind::Student,
            DashboardView::Teacher(_) => DashboardKind::Teacher,
            DashboardView::AcademicStaff(_) => DashboardKind::AcademicStaff,
            DashboardView::Admin(_) => DashboardKind::Admin,
        }
    }
}
