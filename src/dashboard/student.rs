use chrono::{DateTime, Utc};
use futures_util::join;
use uuid::Uuid;

use crate::models::assignments::{self, AssignmentWithCourse};
use crate::models::campus::{
    Announcement, Attendance, AttendanceStatus, ExamResult, Message, Payment, PaymentStatus, Schedule,
};
use crate::models::dashboard::{CourseCard, StatCard, StudentDashboard};
use crate::models::enrollments::EnrollmentWithCourse;
use crate::models::profiles::UserRole;
use crate::models::submissions::{AssignmentStatus, AssignmentSubmission, current_submissions};
use crate::queries::QueryClient;

const RECENT_GRADES: usize = 5;

/// 学生仪表盘所需的钩子结果
#[derive(Debug, Default)]
pub struct StudentData {
    pub enrollments: Vec<EnrollmentWithCourse>,
    pub assignments: Vec<AssignmentWithCourse>,
    pub submissions: Vec<AssignmentSubmission>,
    pub attendance: Vec<Attendance>,
    pub exam_results: Vec<ExamResult>,
    pub payments: Vec<Payment>,
    pub schedules: Vec<Schedule>,
    pub messages: Vec<Message>,
    pub announcements: Vec<Announcement>,
}

pub async fn load(client: &QueryClient, student_id: Option<Uuid>) -> StudentData {
    let (enrollments, assignments, submissions, attendance, exam_results, payments, messages, announcements) = join!(
        client.student_enrollments(student_id),
        client.student_assignments(student_id),
        client.student_submissions(student_id),
        client.student_attendance(student_id),
        client.student_exam_results(student_id),
        client.student_payments(student_id),
        client.unread_messages(student_id),
        client.announcements(Some(UserRole::Student)),
    );
    // 课表依赖选课结果
    let course_ids: Vec<Uuid> = enrollments.data.iter().map(|e| e.enrollment.course_id).collect();
    let schedules = client.course_schedules(&course_ids).await;
    StudentData {
        enrollments: enrollments.data,
        assignments: assignments.data,
        submissions: submissions.data,
        attendance: attendance.data,
        exam_results: exam_results.data,
        payments: payments.data,
        schedules: schedules.data,
        messages: messages.data,
        announcements: announcements.data,
    }
}

/// 出勤率（到课与迟到计为出勤），无记录时为 `None`
pub fn attendance_rate(records: &[Attendance]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let attended = records
        .iter()
        .filter(|r| matches!(r.status, AttendanceStatus::Present | AttendanceStatus::Late))
        .count();
    Some(attended as f64 * 100.0 / records.len() as f64)
}

pub fn assemble(data: StudentData, now: DateTime<Utc>) -> StudentDashboard {
    let courses: Vec<CourseCard> = data
        .enrollments
        .iter()
        .filter(|e| e.enrollment.is_active)
        .filter_map(|e| e.course.as_ref().map(CourseCard::from))
        .collect();

    let upcoming = assignments::upcoming(&data.assignments, now);

    let mut recent_grades: Vec<AssignmentSubmission> = current_submissions(&data.submissions)
        .into_iter()
        .filter(|s| s.status == AssignmentStatus::Graded)
        .cloned()
        .collect();
    recent_grades.sort_by(|a, b| b.graded_at.cmp(&a.graded_at));
    recent_grades.truncate(RECENT_GRADES);

    let outstanding_payments: Vec<Payment> = data
        .payments
        .into_iter()
        .filter(|p| matches!(p.status, PaymentStatus::Pending | PaymentStatus::Overdue))
        .collect();
    let outstanding_total: f64 = outstanding_payments.iter().map(|p| p.amount).sum();

    let attendance = match attendance_rate(&data.attendance) {
        Some(rate) => StatCard::new("Attendance", format!("{rate:.0}%"))
            .with_hint(format!("{} sessions recorded", data.attendance.len())),
        None => StatCard::new("Attendance", "—"),
    };

    let stats = vec![
        StatCard::new("Active Courses", courses.len()),
        StatCard::new("Pending Assignments", upcoming.len()),
        StatCard::new("Graded Work", recent_grades.len()),
        attendance,
        StatCard::new("Outstanding Balance", format!("{outstanding_total:.2}"))
            .with_hint(format!("{} open payments", outstanding_payments.len())),
    ];

    StudentDashboard {
        stats,
        courses,
        upcoming_assignments: upcoming,
        recent_grades,
        exam_results: data.exam_results,
        outstanding_payments,
        schedule: data.schedules,
        unread_messages: data.messages,
        announcements: data.announcements,
    }
}

/// 无资料时展示的空仪表盘
pub fn empty() -> StudentDashboard {
    assemble(StudentData::default(), Utc::now())
}
