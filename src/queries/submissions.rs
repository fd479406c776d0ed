use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use super::{QueryClient, QueryKey, QueryState, assignments, not_found};
use crate::backend::SubmissionFilter;
use crate::errors::{PortalError, Result};
use crate::models::submissions::{
    AssignmentStatus, AssignmentSubmission, GradeSubmissionRequest, GradeUpdate, NewSubmission,
    SubmitAssignmentRequest,
};

fn by_assignment(assignment_id: Uuid) -> QueryKey {
    QueryKey::new("submissions").with("assignment").with(assignment_id)
}

fn by_student(student_id: Uuid) -> QueryKey {
    QueryKey::new("submissions").with("student").with(student_id)
}

impl QueryClient {
    pub async fn assignment_submissions(
        &self,
        assignment_id: Option<Uuid>,
    ) -> QueryState<Vec<AssignmentSubmission>> {
        let Some(assignment_id) = assignment_id else {
            return QueryState::disabled();
        };
        self.read(by_assignment(assignment_id), |backend, token| async move {
            let filter = SubmissionFilter {
                assignment_ids: vec![assignment_id],
                student_id: None,
            };
            backend.list_submissions(&token, &filter).await
        })
        .await
    }

    pub async fn student_submissions(
        &self,
        student_id: Option<Uuid>,
    ) -> QueryState<Vec<AssignmentSubmission>> {
        let Some(student_id) = student_id else {
            return QueryState::disabled();
        };
        self.read(by_student(student_id), |backend, token| async move {
            let filter = SubmissionFilter {
                assignment_ids: Vec::new(),
                student_id: Some(student_id),
            };
            backend.list_submissions(&token, &filter).await
        })
        .await
    }

    /// 提交作业；截止后提交记为 late
    pub async fn submit_assignment(
        &self,
        student_id: Uuid,
        request: &SubmitAssignmentRequest,
    ) -> Result<AssignmentSubmission> {
        let assignment = self
            .backend()
            .get_assignment(self.token(), request.assignment_id)
            .await
            .map_err(not_found("Assignment"))
            .inspect_err(|e| error!("Failed to load assignment {}: {}", request.assignment_id, e))?;
        if !assignment.is_active {
            return Err(PortalError::validation("Assignment is no longer active"));
        }

        let now = Utc::now();
        let status = if now > assignment.due_date {
            AssignmentStatus::Late
        } else {
            AssignmentStatus::Submitted
        };
        let submission = self
            .backend()
            .insert_submission(
                self.token(),
                NewSubmission {
                    assignment_id: assignment.id,
                    student_id,
                    status,
                    content: request.content.clone(),
                    submitted_at: now,
                },
            )
            .await
            .inspect_err(|e| {
                error!(
                    "Failed to submit assignment {} for {}: {}",
                    assignment.id, student_id, e
                )
            })?;

        info!(
            "Student {} submitted assignment {} ({:?})",
            student_id, assignment.id, status
        );
        self.invalidate(&assignments::student_key(student_id)).await;
        self.invalidate(&by_student(student_id)).await;
        self.invalidate(&by_assignment(assignment.id)).await;
        Ok(submission)
    }

    /// 批改提交；分数须在 0 与作业满分之间
    pub async fn grade_submission(
        &self,
        submission_id: Uuid,
        request: &GradeSubmissionRequest,
    ) -> Result<AssignmentSubmission> {
        let submission = self
            .backend()
            .get_submission(self.token(), submission_id)
            .await
            .map_err(not_found("Submission"))
            .inspect_err(|e| error!("Failed to load submission {}: {}", submission_id, e))?;
        let assignment = self
            .backend()
            .get_assignment(self.token(), submission.assignment_id)
            .await
            .map_err(not_found("Assignment"))?;

        if !request.points_earned.is_finite()
            || request.points_earned < 0.0
            || request.points_earned > f64::from(assignment.max_points)
        {
            return Err(PortalError::validation(format!(
                "Points must be between 0 and {}",
                assignment.max_points
            )));
        }

        let update = GradeUpdate {
            status: AssignmentStatus::Graded,
            points_earned: request.points_earned,
            feedback: request.feedback.clone(),
            graded_at: Utc::now(),
        };
        let graded = self
            .backend()
            .update_submission(self.token(), submission_id, &update)
            .await
            .inspect_err(|e| error!("Failed to grade submission {}: {}", submission_id, e))?;

        info!(
            "Submission {} graded: {} / {}",
            submission_id, request.points_earned, assignment.max_points
        );
        self.invalidate(&by_assignment(graded.assignment_id)).await;
        self.invalidate(&by_student(graded.student_id)).await;
        Ok(graded)
    }
}
