use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use futures_util::join;
use uuid::Uuid;

use crate::models::assignments::AssignmentWithCourse;
use crate::models::dashboard::{AssignmentProgress, CourseCard, StatCard, TaughtCourse, TeacherDashboard};
use crate::models::enrollments::Enrollment;
use crate::models::profiles::UserRole;
use crate::models::submissions::{AssignmentSubmission, current_submissions};
use crate::queries::QueryClient;

/// 单个作业的进度：只统计名单内学生的最新一次提交
pub fn progress(
    assignment: &AssignmentWithCourse,
    roster: &[Enrollment],
    submissions: &[AssignmentSubmission],
) -> AssignmentProgress {
    let enrolled: HashSet<Uuid> = roster.iter().map(|e| e.student_id).collect();
    let current: Vec<&AssignmentSubmission> = current_submissions(submissions)
        .into_iter()
        .filter(|s| s.assignment_id == assignment.assignment.id && enrolled.contains(&s.student_id))
        .collect();

    let submitted = current.len();
    let roster_size = enrolled.len();

    AssignmentProgress {
        assignment_id: assignment.assignment.id,
        course_id: assignment.assignment.course_id,
        title: assignment.assignment.title.clone(),
        due_date: assignment.assignment.due_date,
        submitted,
        roster_size,
        awaiting_grading: current.iter().filter(|s| s.status.awaits_grading()).count(),
        all_submitted: roster_size > 0 && submitted == roster_size,
    }
}

pub async fn build(client: &QueryClient, teacher_id: Option<Uuid>, now: DateTime<Utc>) -> TeacherDashboard {
    let (courses, messages, announcements) = join!(
        client.instructor_courses(teacher_id),
        client.unread_messages(teacher_id),
        client.announcements(Some(UserRole::Teacher)),
    );
    let active: Vec<_> = courses.data.into_iter().filter(|c| c.is_active).collect();
    let course_ids: Vec<Uuid> = active.iter().map(|c| c.id).collect();

    // 每门课的名单与作业并发加载
    let per_course = join_all(active.iter().map(|course| async move {
        let (roster, assignments) = join!(
            client.course_roster(Some(course.id)),
            client.course_assignments(Some(course.id)),
        );
        (roster.data, assignments.data)
    }))
    .await;
    let schedule = client.course_schedules(&course_ids).await;

    let mut taught = Vec::with_capacity(active.len());
    let mut progress_rows = Vec::new();
    let mut students: HashSet<Uuid> = HashSet::new();

    for (course, (roster, assignments)) in active.iter().zip(per_course) {
        students.extend(roster.iter().map(|e| e.student_id));

        let submissions = join_all(
            assignments
                .iter()
                .map(|a| client.assignment_submissions(Some(a.assignment.id))),
        )
        .await;
        for (assignment, submissions) in assignments.iter().zip(submissions) {
            progress_rows.push(progress(assignment, &roster, &submissions.data));
        }

        taught.push(TaughtCourse {
            card: CourseCard::from(course),
            roster_size: roster.len(),
        });
    }
    progress_rows.sort_by_key(|p| p.due_date);

    let awaiting: usize = progress_rows.iter().map(|p| p.awaiting_grading).sum();
    let week_end = now + Duration::days(7);
    let due_this_week = progress_rows
        .iter()
        .filter(|p| p.due_date > now && p.due_date <= week_end)
        .count();

    TeacherDashboard {
        stats: vec![
            StatCard::new("Courses Taught", taught.len()),
            StatCard::new("Total Students", students.len()),
            StatCard::new("Awaiting Grading", awaiting),
            StatCard::new("Due This Week", due_this_week),
        ],
        courses: taught,
        assignments: progress_rows,
        schedule: schedule.data,
        unread_messages: messages.data,
        announcements: announcements.data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::assignments::Assignment;
    use crate::models::submissions::AssignmentStatus;
    use crate::queries::test_support::signed_in;

    fn assignment() -> AssignmentWithCourse {
        AssignmentWithCourse {
            assignment: Assignment {
                id: Uuid::new_v4(),
                course_id: Uuid::new_v4(),
                title: "Essay".to_string(),
                description: None,
                due_date: Utc::now(),
                max_points: 10,
                is_active: true,
                created_at: Utc::now(),
            },
            course: None,
        }
    }

    fn enrollment(student_id: Uuid) -> Enrollment {
        Enrollment {
            id: Uuid::new_v4(),
            student_id,
            course_id: Uuid::nil(),
            enrollment_date: Utc::now(),
            is_active: true,
        }
    }

    fn submission(assignment_id: Uuid, student_id: Uuid, status: AssignmentStatus) -> AssignmentSubmission {
        AssignmentSubmission {
            id: Uuid::new_v4(),
            assignment_id,
            student_id,
            status,
            content: None,
            points_earned: None,
            feedback: None,
            submitted_at: Some(Utc::now()),
            graded_at: None,
        }
    }

    #[test]
    fn test_empty_roster_is_never_all_submitted() {
        let row = progress(&assignment(), &[], &[]);
        assert_eq!(row.roster_size, 0);
        assert!(!row.all_submitted);
    }

    #[test]
    fn test_all_submitted_counts_roster_students_only() {
        let a = assignment();
        let id = a.assignment.id;
        let (alice, bob, outsider) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let roster = vec![enrollment(alice), enrollment(bob)];

        let partial = vec![
            submission(id, alice, AssignmentStatus::Submitted),
            submission(id, outsider, AssignmentStatus::Submitted),
        ];
        let row = progress(&a, &roster, &partial);
        assert_eq!(row.submitted, 1);
        assert!(!row.all_submitted);

        let complete = vec![
            submission(id, alice, AssignmentStatus::Graded),
            submission(id, bob, AssignmentStatus::Late),
        ];
        let row = progress(&a, &roster, &complete);
        assert!(row.all_submitted);
        assert_eq!(row.awaiting_grading, 1);
    }

    #[tokio::test]
    async fn test_demo_teacher_dashboard() {
        let (_, session, client) = signed_in("teacher@campus.test").await;
        let dashboard = build(&client, Some(session.user.id), Utc::now()).await;

        // 已停用课程不展示
        assert_eq!(dashboard.courses.len(), 2);
        assert_eq!(dashboard.assignments.len(), 3);
        assert_eq!(dashboard.stats[1], StatCard::new("Total Students", 1));
        assert_eq!(dashboard.stats[2], StatCard::new("Awaiting Grading", 1));
        assert_eq!(dashboard.stats[3], StatCard::new("Due This Week", 2));
        assert_eq!(dashboard.schedule.len(), 2);
        assert!(dashboard.unread_messages.is_empty());

        let pending: Vec<_> = dashboard.assignments.iter().filter(|p| !p.all_submitted).collect();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Problem Set 3");
    }
}
