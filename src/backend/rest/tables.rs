use uuid::Uuid;

use super::{RestBackend, Select};
use crate::backend::{Backend, SignUpOutcome, SubmissionFilter};
use crate::errors::Result;
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

// 内联联表：只保留该学生有效选课下的作业
fn student_assignments(student_id: Uuid) -> Select {
    Select::from("assignments")
        .columns("*,courses!inner(name,code,enrollments!inner(student_id,is_active))")
        .eq("courses.enrollments.student_id", student_id)
        .eq("courses.enrollments.is_active", true)
        .eq("is_active", true)
        .order("due_date", true)
}

#[async_trait::async_trait]
impl Backend for RestBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        self.auth_sign_up(email, password).await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession> {
        self.auth_sign_in(email, password).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.auth_sign_out(access_token).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession> {
        self.auth_refresh(refresh_token).await
    }

    async fn get_identity(&self, access_token: &str) -> Result<Identity> {
        self.auth_user(access_token).await
    }

    async fn get_profile(&self, token: &str, id: Uuid) -> Result<Profile> {
        self.fetch_one(token, &Select::from("profiles").eq("id", id))
            .await
    }

    async fn insert_profile(&self, token: &str, profile: NewProfile) -> Result<Profile> {
        self.insert_one(token, "profiles", &profile).await
    }

    async fn update_profile(
        &self,
        token: &str,
        id: Uuid,
        update: &UpdateProfileRequest,
    ) -> Result<Profile> {
        // updated_at 由表触发器维护
        self.update_one(token, &Select::from("profiles").eq("id", id), update)
            .await
    }

    async fn list_profiles(&self, token: &str) -> Result<Vec<Profile>> {
        self.fetch(token, &Select::from("profiles").order("created_at", false))
            .await
    }

    async fn list_courses(&self, token: &str, filter: &CourseFilter) -> Result<Vec<Course>> {
        let mut select = Select::from("courses");
        if let Some(instructor) = filter.instructor_id {
            select = select.eq("instructor_id", instructor);
        }
        if filter.active_only {
            select = select.eq("is_active", true);
        }
        self.fetch(token, &select.order("name", true)).await
    }

    async fn get_course(&self, token: &str, id: Uuid) -> Result<Course> {
        self.fetch_one(token, &Select::from("courses").eq("id", id))
            .await
    }

    async fn insert_course(&self, token: &str, course: &CreateCourseRequest) -> Result<Course> {
        self.insert_one(token, "courses", course).await
    }

    async fn update_course(
        &self,
        token: &str,
        id: Uuid,
        update: &UpdateCourseRequest,
    ) -> Result<Course> {
        self.update_one(token, &Select::from("courses").eq("id", id), update)
            .await
    }

    async fn list_student_enrollments(
        &self,
        token: &str,
        student_id: Uuid,
    ) -> Result<Vec<EnrollmentWithCourse>> {
        let select = Select::from("enrollments")
            .columns("*,courses(*)")
            .eq("student_id", student_id)
            .eq("is_active", true)
            .order("enrollment_date", false);
        self.fetch(token, &select).await
    }

    async fn list_course_enrollments(
        &self,
        token: &str,
        course_id: Uuid,
    ) -> Result<Vec<Enrollment>> {
        let select = Select::from("enrollments")
            .eq("course_id", course_id)
            .eq("is_active", true);
        self.fetch(token, &select).await
    }

    async fn insert_enrollment(&self, token: &str, enrollment: NewEnrollment) -> Result<Enrollment> {
        // 重复选课由表上的唯一约束拒绝（409）
        self.insert_one(token, "enrollments", &enrollment).await
    }

    async fn list_student_assignments(
        &self,
        token: &str,
        student_id: Uuid,
    ) -> Result<Vec<AssignmentWithCourse>> {
        self.fetch(token, &student_assignments(student_id)).await
    }

    async fn list_course_assignments(
        &self,
        token: &str,
        course_ids: &[Uuid],
    ) -> Result<Vec<AssignmentWithCourse>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let select = Select::from("assignments")
            .columns("*,courses(name,code)")
            .is_in("course_id", course_ids)
            .eq("is_active", true)
            .order("due_date", true);
        self.fetch(token, &select).await
    }

    async fn get_assignment(&self, token: &str, id: Uuid) -> Result<Assignment> {
        self.fetch_one(token, &Select::from("assignments").eq("id", id))
            .await
    }

    async fn insert_assignment(
        &self,
        token: &str,
        assignment: &CreateAssignmentRequest,
    ) -> Result<Assignment> {
        self.insert_one(token, "assignments", assignment).await
    }

    async fn list_submissions(
        &self,
        token: &str,
        filter: &SubmissionFilter,
    ) -> Result<Vec<AssignmentSubmission>> {
        let mut select = Select::from("assignment_submissions");
        if !filter.assignment_ids.is_empty() {
            select = select.is_in("assignment_id", &filter.assignment_ids);
        }
        if let Some(student) = filter.student_id {
            select = select.eq("student_id", student);
        }
        self.fetch(token, &select.order("submitted_at", false))
            .await
    }

    async fn get_submission(&self, token: &str, id: Uuid) -> Result<AssignmentSubmission> {
        self.fetch_one(token, &Select::from("assignment_submissions").eq("id", id))
            .await
    }

    async fn insert_submission(
        &self,
        token: &str,
        submission: NewSubmission,
    ) -> Result<AssignmentSubmission> {
        self.insert_one(token, "assignment_submissions", &submission)
            .await
    }

    async fn update_submission(
        &self,
        token: &str,
        id: Uuid,
        update: &GradeUpdate,
    ) -> Result<AssignmentSubmission> {
        self.update_one(
            token,
            &Select::from("assignment_submissions").eq("id", id),
            update,
        )
        .await
    }

    async fn list_announcements(
        &self,
        token: &str,
        role: Option<UserRole>,
        limit: usize,
    ) -> Result<Vec<Announcement>> {
        let mut select = Select::from("announcements");
        select = match role {
            Some(role) => select.or(&[
                "target_role.is.null".to_string(),
                format!("target_role.eq.{role}"),
            ]),
            None => select.is_null("target_role"),
        };
        self.fetch(token, &select.order("created_at", false).limit(limit))
            .await
    }

    async fn list_attendance(&self, token: &str, student_id: Uuid) -> Result<Vec<Attendance>> {
        let select = Select::from("attendance")
            .eq("student_id", student_id)
            .order("date", false);
        self.fetch(token, &select).await
    }

    async fn list_exam_results(&self, token: &str, student_id: Uuid) -> Result<Vec<ExamResult>> {
        let select = Select::from("exam_results")
            .columns("*,exams(*)")
            .eq("student_id", student_id);
        self.fetch(token, &select).await
    }

    async fn list_payments(&self, token: &str, student_id: Uuid) -> Result<Vec<Payment>> {
        let select = Select::from("payments")
            .eq("student_id", student_id)
            .order("due_date", true);
        self.fetch(token, &select).await
    }

    async fn list_departments(&self, token: &str) -> Result<Vec<Department>> {
        self.fetch(token, &Select::from("departments").order("name", true))
            .await
    }

    async fn list_schedules(&self, token: &str, course_ids: &[Uuid]) -> Result<Vec<Schedule>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let select = Select::from("schedules")
            .is_in("course_id", course_ids)
            .order("day_of_week", true)
            .order("start_time", true);
        self.fetch(token, &select).await
    }

    async fn list_course_materials(
        &self,
        token: &str,
        course_id: Uuid,
    ) -> Result<Vec<CourseMaterial>> {
        let select = Select::from("course_materials")
            .eq("course_id", course_id)
            .order("uploaded_at", false);
        self.fetch(token, &select).await
    }

    async fn list_unread_messages(&self, token: &str, recipient_id: Uuid) -> Result<Vec<Message>> {
        let select = Select::from("messages")
            .eq("recipient_id", recipient_id)
            .eq("is_read", false)
            .order("created_at", false);
        self.fetch(token, &select).await
    }

    async fn list_system_settings(&self, token: &str) -> Result<Vec<SystemSetting>> {
        self.fetch(token, &Select::from("system_settings").order("key", true))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_grade_update_body_shape() {
        let update = GradeUpdate {
            status: crate::models::submissions::AssignmentStatus::Graded,
            points_earned: 18.5,
            feedback: None,
            graded_at: chrono::DateTime::from_timestamp(0, 0).unwrap_or_default(),
        };
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(
            body,
            json!({
                "status": "graded",
                "points_earned": 18.5,
                "graded_at": "1970-01-01T00:00:00Z"
            })
        );
    }

    #[test]
    fn test_student_assignments_require_active_enrollment() {
        let query = student_assignments(uuid::Uuid::nil()).to_query();
        let pair = |k: &str, v: &str| (k.to_string(), v.to_string());
        assert_eq!(
            query[0],
            pair(
                "select",
                "*,courses!inner(name,code,enrollments!inner(student_id,is_active))"
            )
        );
        assert!(query.contains(&pair(
            "courses.enrollments.student_id",
            "eq.00000000-0000-0000-0000-000000000000"
        )));
        assert!(query.contains(&pair("courses.enrollments.is_active", "eq.true")));
        assert!(query.contains(&pair("is_active", "eq.true")));
    }

    #[test]
    fn test_course_update_body_only_carries_set_fields() {
        let update = UpdateCourseRequest {
            name: Some("Discrete Maths".to_string()),
            is_active: Some(false),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({"name": "Discrete Maths", "is_active": false})
        );
    }
}
