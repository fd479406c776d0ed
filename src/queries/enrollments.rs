use tracing::{error, info};
use uuid::Uuid;

use super::{QueryClient, QueryKey, QueryState, assignments, not_found};
use crate::errors::{PortalError, Result};
use crate::models::enrollments::{Enrollment, EnrollmentWithCourse, NewEnrollment};

fn by_student(student_id: Uuid) -> QueryKey {
    QueryKey::new("enrollments").with(student_id)
}

fn by_course(course_id: Uuid) -> QueryKey {
    QueryKey::new("enrollments").with("course").with(course_id)
}

impl QueryClient {
    /// 学生的有效选课，联表课程
    pub async fn student_enrollments(
        &self,
        student_id: Option<Uuid>,
    ) -> QueryState<Vec<EnrollmentWithCourse>> {
        let Some(student_id) = student_id else {
            return QueryState::disabled();
        };
        self.read(by_student(student_id), |backend, token| async move {
            backend.list_student_enrollments(&token, student_id).await
        })
        .await
    }

    /// 课程名单
    pub async fn course_roster(&self, course_id: Option<Uuid>) -> QueryState<Vec<Enrollment>> {
        let Some(course_id) = course_id else {
            return QueryState::disabled();
        };
        self.read(by_course(course_id), |backend, token| async move {
            backend.list_course_enrollments(&token, course_id).await
        })
        .await
    }

    /// 选课；只能选开放中的课程
    pub async fn enroll_student(&self, student_id: Uuid, course_id: Uuid) -> Result<Enrollment> {
        let course = self
            .backend()
            .get_course(self.token(), course_id)
            .await
            .map_err(not_found("Course"))
            .inspect_err(|e| error!("Failed to load course {}: {}", course_id, e))?;
        if !course.is_active {
            return Err(PortalError::validation("Course is not open for enrollment"));
        }

        let enrollment = self
            .backend()
            .insert_enrollment(
                self.token(),
                NewEnrollment {
                    student_id,
                    course_id,
                },
            )
            .await
            .inspect_err(|e| {
                error!("Failed to enroll {} in course {}: {}", student_id, course_id, e)
            })?;

        info!("Student {} enrolled in {}", student_id, course.code);
        self.invalidate(&by_student(student_id)).await;
        self.invalidate(&by_course(course_id)).await;
        self.invalidate(&assignments::student_key(student_id)).await;
        Ok(enrollment)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::signed_in;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_student_enrollments_embed_course() {
        let (_, session, client) = signed_in("student@campus.test").await;
        let state = client.student_enrollments(Some(session.user.id)).await;

        assert_eq!(state.data.len(), 2);
        let codes: Vec<String> = state
            .data
            .iter()
            .filter_map(|e| e.course.as_ref().map(|c| c.code.clone()))
            .collect();
        assert!(codes.contains(&"CS101".to_string()));
        // 最近的选课在前
        assert!(state.data[0].enrollment.enrollment_date >= state.data[1].enrollment.enrollment_date);
    }

    #[tokio::test]
    async fn test_roster_disabled_without_course() {
        let (_, _, client) = signed_in("teacher@campus.test").await;
        assert!(client.course_roster(None).await.is_loading);
    }

    #[tokio::test]
    async fn test_enroll_invalidates_enrollments_and_assignments() {
        let (backend, session, client) = signed_in("student@campus.test").await;
        let me = Some(session.user.id);
        let statistics = backend
            .with_tables(|t| t.courses.iter().find(|c| c.code == "MATH210").map(|c| c.id))
            .unwrap();
        let enrolled = client.student_enrollments(me).await.data.len();
        let assignments = client.student_assignments(me).await.data.len();
        let roster = client.course_roster(Some(statistics)).await.data.len();

        let reads = backend.reads();
        client.student_enrollments(me).await;
        assert_eq!(backend.reads(), reads, "second read is served from cache");

        let enrollment = client
            .enroll_student(session.user.id, statistics)
            .await
            .unwrap();
        assert!(enrollment.is_active);

        assert_eq!(client.student_enrollments(me).await.data.len(), enrolled + 1);
        assert_eq!(client.course_roster(Some(statistics)).await.data.len(), roster + 1);
        let reads = backend.reads();
        assert_eq!(client.student_assignments(me).await.data.len(), assignments);
        assert_eq!(backend.reads(), reads + 1, "assignments were refetched");

        let err = client
            .enroll_student(session.user.id, statistics)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E007");
    }

    #[tokio::test]
    async fn test_enroll_rejects_closed_and_unknown_courses() {
        let (backend, session, client) = signed_in("student@campus.test").await;
        let legacy = backend
            .with_tables(|t| t.courses.iter().find(|c| c.code == "CS099").map(|c| c.id))
            .unwrap();

        let err = client.enroll_student(session.user.id, legacy).await.unwrap_err();
        assert_eq!(err.code(), "E007");
        let err = client
            .enroll_student(session.user.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E008");
    }
}
