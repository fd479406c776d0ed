use chrono::{DateTime, Utc};
use tracing::{error, info};
use uuid::Uuid;

use super::{QueryClient, QueryKey, QueryState, not_found};
use crate::errors::{PortalError, Result};
use crate::models::assignments::{self, Assignment, AssignmentWithCourse, CreateAssignmentRequest};

pub(crate) fn student_key(student_id: Uuid) -> QueryKey {
    QueryKey::new("assignments").with(student_id)
}

pub(crate) fn course_key(course_id: Uuid) -> QueryKey {
    QueryKey::new("assignments").with("course").with(course_id)
}

impl QueryClient {
    /// 学生所选课程下的有效作业，联表课程名称/代码，按截止时间升序
    pub async fn student_assignments(
        &self,
        student_id: Option<Uuid>,
    ) -> QueryState<Vec<AssignmentWithCourse>> {
        let Some(student_id) = student_id else {
            return QueryState::disabled();
        };
        self.read(student_key(student_id), |backend, token| async move {
            backend.list_student_assignments(&token, student_id).await
        })
        .await
    }

    /// 截止时间晚于 `now` 的作业
    pub async fn upcoming_assignments(
        &self,
        student_id: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> QueryState<Vec<AssignmentWithCourse>> {
        self.student_assignments(student_id)
            .await
            .map(|all| assignments::upcoming(&all, now))
    }

    pub async fn course_assignments(
        &self,
        course_id: Option<Uuid>,
    ) -> QueryState<Vec<AssignmentWithCourse>> {
        let Some(course_id) = course_id else {
            return QueryState::disabled();
        };
        self.read(course_key(course_id), |backend, token| async move {
            backend.list_course_assignments(&token, &[course_id]).await
        })
        .await
    }

    /// 布置作业；`instructor` 为 `Some` 时只能布置到自己任教的课程
    pub async fn create_assignment(
        &self,
        request: &CreateAssignmentRequest,
        instructor: Option<Uuid>,
    ) -> Result<Assignment> {
        let course = self
            .backend()
            .get_course(self.token(), request.course_id)
            .await
            .map_err(not_found("Course"))
            .inspect_err(|e| error!("Failed to load course {}: {}", request.course_id, e))?;
        if !course.is_active {
            return Err(PortalError::validation("Course is no longer active"));
        }
        if let Some(instructor) = instructor {
            if course.instructor_id != Some(instructor) {
                return Err(PortalError::authorization(
                    "Only the course instructor can add assignments",
                ));
            }
        }

        let assignment = self
            .backend()
            .insert_assignment(self.token(), request)
            .await
            .inspect_err(|e| {
                error!("Failed to create assignment for course {}: {}", course.id, e)
            })?;

        info!(
            "Assignment {} created in course {}",
            assignment.id, course.code
        );
        self.invalidate(&course_key(course.id)).await;
        Ok(assignment)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::signed_in;
    use super::*;

    #[tokio::test]
    async fn test_disabled_without_student_id() {
        let (backend, _, client) = signed_in("student@campus.test").await;
        let reads = backend.reads();

        let state = client.student_assignments(None).await;

        assert!(state.is_loading);
        assert!(state.data.is_empty());
        assert_eq!(backend.reads(), reads);
    }

    #[tokio::test]
    async fn test_student_assignments_are_active_and_sorted() {
        let (_, session, client) = signed_in("student@campus.test").await;
        let state = client.student_assignments(Some(session.user.id)).await;

        assert!(!state.is_loading);
        assert_eq!(state.data.len(), 3);
        assert!(state.data.iter().all(|a| a.assignment.is_active));
        assert!(state.data.iter().all(|a| a.course.is_some()));
        assert!(
            state
                .data
                .windows(2)
                .all(|w| w[0].assignment.due_date <= w[1].assignment.due_date)
        );

        let upcoming = client
            .upcoming_assignments(Some(session.user.id), Utc::now())
            .await;
        assert_eq!(upcoming.data.len(), 2);
    }

    #[tokio::test]
    async fn test_inactive_enrollment_hides_assignments() {
        let (backend, session, client) = signed_in("student@campus.test").await;
        let student = session.user.id;
        backend.with_tables(|t| {
            t.enrollments
                .iter_mut()
                .filter(|e| e.student_id == student)
                .for_each(|e| e.is_active = false)
        });

        assert!(client.student_assignments(Some(student)).await.data.is_empty());
        assert!(client.student_enrollments(Some(student)).await.data.is_empty());
    }

    fn lab(course_id: Uuid) -> CreateAssignmentRequest {
        CreateAssignmentRequest {
            course_id,
            title: "Lab 3: Recursion".to_string(),
            description: None,
            due_date: Utc::now() + chrono::Duration::days(7),
            max_points: 20,
        }
    }

    #[tokio::test]
    async fn test_create_assignment_invalidates_course_assignments() {
        let (backend, session, client) = signed_in("teacher@campus.test").await;
        let course = backend
            .with_tables(|t| t.courses.iter().find(|c| c.code == "CS101").map(|c| c.id))
            .unwrap();
        let before = client.course_assignments(Some(course)).await.data.len();

        let reads = backend.reads();
        client.course_assignments(Some(course)).await;
        assert_eq!(backend.reads(), reads, "second read is served from cache");

        let created = client
            .create_assignment(&lab(course), Some(session.user.id))
            .await
            .unwrap();
        assert!(created.is_active);

        let after = client.course_assignments(Some(course)).await.data;
        assert_eq!(after.len(), before + 1);
        assert!(after.iter().any(|a| a.assignment.id == created.id));
    }

    #[tokio::test]
    async fn test_create_assignment_checks_course_owner_and_state() {
        let (backend, session, client) = signed_in("teacher@campus.test").await;
        let (unowned, legacy) = backend.with_tables(|t| {
            let id = |code: &str| t.courses.iter().find(|c| c.code == code).map(|c| c.id);
            (id("MATH210").unwrap(), id("CS099").unwrap())
        });

        let err = client
            .create_assignment(&lab(unowned), Some(session.user.id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E013");
        // 管理员不受任课限制
        assert!(client.create_assignment(&lab(unowned), None).await.is_ok());

        let err = client
            .create_assignment(&lab(legacy), Some(session.user.id))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");

        let err = client
            .create_assignment(&lab(Uuid::new_v4()), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
    }
}
