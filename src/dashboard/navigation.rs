use serde::Serialize;

use crate::models::dashboard::{DashboardKind, NavItem};
use crate::models::profiles::UserRole;

const fn item(id: &'static str, label: &'static str, icon: &'static str) -> NavItem {
    NavItem { id, label, icon }
}

const STUDENT_NAV: &[NavItem] = &[
    item("dashboard", "Dashboard", "bar-chart-3"),
    item("courses", "My Courses", "book-open"),
    item("assignments", "Assignments", "file-text"),
    item("grades", "Grades", "graduation-cap"),
    item("attendance", "Attendance", "user-check"),
    item("schedule", "Schedule", "calendar"),
    item("payments", "Payments", "credit-card"),
    item("announcements", "Announcements", "bell"),
    item("messages", "Messages", "mail"),
];

const TEACHER_NAV: &[NavItem] = &[
    item("dashboard", "Dashboard", "bar-chart-3"),
    item("my-courses", "My Courses", "book-open"),
    item("schedule", "My Schedule", "calendar"),
    item("assignments", "Assignments", "file-text"),
    item("grades", "Student Grades", "graduation-cap"),
    item("materials", "Course Materials", "upload"),
    item("announcements", "Announcements", "bell"),
    item("messages", "Messages", "mail"),
];

const STAFF_NAV: &[NavItem] = &[
    item("dashboard", "Dashboard", "bar-chart-3"),
    item("lecturers", "Manage Lecturers", "users"),
    item("timetables", "Timetables", "calendar"),
    item("students", "Student Records", "graduation-cap"),
    item("courses", "Course Content", "book-open"),
    item("attendance", "Attendance", "user-check"),
    item("exams", "Exam Schedules", "file-text"),
    item("payments", "Student Payments", "credit-card"),
    item("announcements", "Announcements", "bell"),
    item("messages", "Bulk Emails", "mail"),
];

const ADMIN_NAV: &[NavItem] = &[
    item("dashboard", "Dashboard", "bar-chart-3"),
    item("academic-staff", "Academic Staff", "users"),
    item("lecturers", "Lecturers", "users"),
    item("students", "Students", "graduation-cap"),
    item("courses", "Courses", "book-open"),
    item("payments", "Payment System", "credit-card"),
    item("roles", "User Roles", "settings"),
    item("reports", "Reports", "bar-chart-3"),
    item("messages", "Email System", "mail"),
];

/// 角色对应的导航项；未知角色按学生处理
pub fn navigation_for(role: UserRole) -> &'static [NavItem] {
    match role {
        UserRole::Teacher => TEACHER_NAV,
        UserRole::AcademicStaff => STAFF_NAV,
        UserRole::Admin => ADMIN_NAV,
        UserRole::Student | UserRole::Unrecognized => STUDENT_NAV,
    }
}

/// 角色对应的仪表盘；未知角色按学生处理
pub fn dashboard_for(role: UserRole) -> DashboardKind {
    match role {
        UserRole::Teacher => DashboardKind::Teacher,
        UserRole::AcademicStaff => DashboardKind::AcademicStaff,
        UserRole::Admin => DashboardKind::Admin,
        UserRole::Student | UserRole::Unrecognized => DashboardKind::Student,
    }
}

/// 侧边导航面板的展开状态，初始展开
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavPanel {
    pub open: bool,
}

impl Default for NavPanel {
    fn default() -> Self {
        Self { open: true }
    }
}

impl NavPanel {
    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}
