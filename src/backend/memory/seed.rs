use chrono::{Duration, NaiveTime, Utc};
use uuid::Uuid;

use super::MemoryBackend;
use crate::errors::{PortalError, Result};
use crate::models::{
    assignments::Assignment,
    campus::{
        Announcement, Attendance, AttendanceStatus, CourseMaterial, Department, Exam, ExamResult,
        Message, Payment, PaymentMethod, PaymentStatus, Schedule, SystemSetting,
    },
    courses::Course,
    enrollments::Enrollment,
    profiles::UserRole,
    submissions::{AssignmentStatus, AssignmentSubmission},
};

pub const DEMO_PASSWORD: &str = "Campus2026";

// (邮箱, 姓名, 角色)
pub(super) const DEMO_ACCOUNTS: [(&str, &str, UserRole); 4] = [
    ("student@campus.test", "Sam Student", UserRole::Student),
    ("teacher@campus.test", "Tess Teacher", UserRole::Teacher),
    ("staff@campus.test", "Sasha Registrar", UserRole::AcademicStaff),
    ("admin@campus.test", "Alex Admin", UserRole::Admin),
];

fn time(hour: u32, minute: u32) -> Result<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| PortalError::date_parse(format!("Invalid time {hour}:{minute}")))
}

pub(super) fn populate(backend: &MemoryBackend) -> Result<()> {
    let mut profiles = Vec::with_capacity(DEMO_ACCOUNTS.len());
    for (email, name, role) in DEMO_ACCOUNTS {
        profiles.push(backend.add_account(email, DEMO_PASSWORD, name, role)?);
    }
    let student = profiles[0].id;
    let teacher = profiles[1].id;
    let staff = profiles[2].id;
    let admin = profiles[3].id;

    let now = Utc::now();
    let today = now.date_naive();

    let sciences = Department {
        id: Uuid::new_v4(),
        name: "Computer Science".to_string(),
        code: "CS".to_string(),
        head_id: Some(teacher),
    };
    let maths = Department {
        id: Uuid::new_v4(),
        name: "Mathematics".to_string(),
        code: "MATH".to_string(),
        head_id: Some(staff),
    };

    let course = |name: &str, code: &str, dept: Uuid, instructor: Option<Uuid>, active: bool| {
        Course {
            id: Uuid::new_v4(),
            name: name.to_string(),
            code: code.to_string(),
            description: None,
            credits: 3,
            semester: "Fall".to_string(),
            academic_year: "2026-2027".to_string(),
            department_id: Some(dept),
            instructor_id: instructor,
            is_active: active,
            created_at: now - Duration::days(60),
        }
    };
    let programming = course("Intro to Programming", "CS101", sciences.id, Some(teacher), true);
    let algebra = course("Linear Algebra", "MATH201", maths.id, Some(teacher), true);
    let statistics = course("Statistics", "MATH210", maths.id, None, true);
    let archived = course("Legacy Systems", "CS099", sciences.id, Some(teacher), false);

    let enroll = |course_id: Uuid, days_ago: i64| Enrollment {
        id: Uuid::new_v4(),
        student_id: student,
        course_id,
        enrollment_date: now - Duration::days(days_ago),
        is_active: true,
    };

    let assignment = |course_id: Uuid, title: &str, due: Duration, active: bool| Assignment {
        id: Uuid::new_v4(),
        course_id,
        title: title.to_string(),
        description: None,
        due_date: now + due,
        max_points: 20,
        is_active: active,
        created_at: now - Duration::days(14),
    };
    let lab_one = assignment(programming.id, "Lab 1: Variables", Duration::days(-3), true);
    let lab_two = assignment(programming.id, "Lab 2: Loops", Duration::days(2), true);
    let problem_set = assignment(algebra.id, "Problem Set 3", Duration::days(5), true);
    let draft = assignment(algebra.id, "Problem Set 4 (draft)", Duration::days(12), false);

    let submissions = vec![
        AssignmentSubmission {
            id: Uuid::new_v4(),
            assignment_id: lab_one.id,
            student_id: student,
            status: AssignmentStatus::Graded,
            content: Some("print(\"hello\")".to_string()),
            points_earned: Some(18.0),
            feedback: Some("Clean solution".to_string()),
            submitted_at: Some(now - Duration::days(4)),
            graded_at: Some(now - Duration::days(2)),
        },
        AssignmentSubmission {
            id: Uuid::new_v4(),
            assignment_id: lab_two.id,
            student_id: student,
            status: AssignmentStatus::Submitted,
            content: Some("for i in range(10): ...".to_string()),
            points_earned: None,
            feedback: None,
            submitted_at: Some(now - Duration::hours(6)),
            graded_at: None,
        },
    ];

    let announcement = |title: &str, target: Option<UserRole>, hours_ago: i64| Announcement {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: format!("{title}. See the notice board for details."),
        author_id: Some(admin),
        target_role: target,
        course_id: None,
        created_at: now - Duration::hours(hours_ago),
    };

    let midterm = Exam {
        id: Uuid::new_v4(),
        course_id: programming.id,
        title: "CS101 Midterm".to_string(),
        exam_date: now - Duration::days(10),
        max_points: 100,
    };

    backend.with_tables(|tables| -> Result<()> {
        for profile in tables.profiles.iter_mut() {
            match profile.role {
                UserRole::Student => profile.student_id = Some("STU-2026-001".to_string()),
                _ => profile.employee_id = Some(format!("EMP-{}", &profile.id.simple().to_string()[..6])),
            }
        }

        tables.enrollments = vec![enroll(programming.id, 30), enroll(algebra.id, 29)];
        tables.assignments = vec![lab_one, lab_two, problem_set, draft];
        tables.submissions = submissions;
        tables.courses = vec![programming.clone(), algebra.clone(), statistics, archived];
        tables.departments = vec![sciences, maths];

        tables.announcements = vec![
            announcement("Welcome to the new semester", None, 72),
            announcement("Exam timetable published", Some(UserRole::Student), 24),
            announcement("Staff meeting on Friday", Some(UserRole::Teacher), 12),
            announcement("Budget review deadline", Some(UserRole::AcademicStaff), 6),
            announcement("Maintenance window tonight", Some(UserRole::Admin), 2),
        ];

        tables.attendance = [
            (1, AttendanceStatus::Present),
            (3, AttendanceStatus::Late),
            (8, AttendanceStatus::Absent),
        ]
        .into_iter()
        .map(|(days_ago, status)| Attendance {
            id: Uuid::new_v4(),
            course_id: programming.id,
            student_id: student,
            date: today - Duration::days(days_ago),
            status,
        })
        .collect();

        tables.exam_results = vec![ExamResult {
            id: Uuid::new_v4(),
            exam_id: midterm.id,
            student_id: student,
            points_earned: 84.0,
            grade: Some("B+".to_string()),
            exam: None,
        }];
        tables.exams = vec![midterm];

        tables.payments = vec![
            Payment {
                id: Uuid::new_v4(),
                student_id: student,
                amount: 1250.0,
                payment_method: None,
                status: PaymentStatus::Pending,
                description: "Tuition, Fall term".to_string(),
                due_date: today + Duration::days(30),
                paid_at: None,
            },
            Payment {
                id: Uuid::new_v4(),
                student_id: student,
                amount: 40.0,
                payment_method: Some(PaymentMethod::Card),
                status: PaymentStatus::Paid,
                description: "Library fee".to_string(),
                due_date: today - Duration::days(20),
                paid_at: Some(now - Duration::days(21)),
            },
        ];

        tables.schedules = vec![
            Schedule {
                id: Uuid::new_v4(),
                course_id: programming.id,
                day_of_week: 1,
                start_time: time(9, 0)?,
                end_time: time(10, 30)?,
                room: Some("B-204".to_string()),
            },
            Schedule {
                id: Uuid::new_v4(),
                course_id: algebra.id,
                day_of_week: 3,
                start_time: time(14, 0)?,
                end_time: time(15, 30)?,
                room: Some("M-110".to_string()),
            },
        ];

        tables.materials = vec![CourseMaterial {
            id: Uuid::new_v4(),
            course_id: programming.id,
            title: "Syllabus".to_string(),
            file_url: None,
            material_type: "document".to_string(),
            uploaded_at: now - Duration::days(40),
        }];

        tables.messages = vec![Message {
            id: Uuid::new_v4(),
            sender_id: teacher,
            recipient_id: student,
            subject: "Lab 2 feedback".to_string(),
            body: "I'll review your loops submission this week.".to_string(),
            is_read: false,
            created_at: now - Duration::hours(3),
        }];

        tables.settings = vec![
            SystemSetting {
                key: "academic_year".to_string(),
                value: "2026-2027".to_string(),
                description: Some("Current academic year".to_string()),
            },
            SystemSetting {
                key: "registration_open".to_string(),
                value: "true".to_string(),
                description: None,
            },
        ];
        Ok(())
    })
}
