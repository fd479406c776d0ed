use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

// 提交状态（assignment_status 枚举）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub enum AssignmentStatus {
    Pending,
    Submitted,
    Graded,
    Late,
}

impl AssignmentStatus {
    /// 已交但未批改
    pub fn awaits_grading(&self) -> bool {
        matches!(self, AssignmentStatus::Submitted | AssignmentStatus::Late)
    }
}

// 作业提交（assignment_submissions 表）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct AssignmentSubmission {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub status: AssignmentStatus,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub points_earned: Option<f64>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub graded_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 每个 (作业, 学生) 只取最新一次提交。表上没有唯一约束，
/// 同一学生多次提交时以 `submitted_at` 最大者为准。
pub fn current_submissions(
    submissions: &[AssignmentSubmission],
) -> Vec<&AssignmentSubmission> {
    let mut latest: HashMap<(Uuid, Uuid), &AssignmentSubmission> = HashMap::new();
    for submission in submissions {
        let key = (submission.assignment_id, submission.student_id);
        match latest.get(&key) {
            Some(existing) if existing.submitted_at >= submission.submitted_at => {}
            _ => {
                latest.insert(key, submission);
            }
        }
    }
    let mut current: Vec<&AssignmentSubmission> = latest.into_values().collect();
    current.sort_by_key(|s| (s.assignment_id, s.student_id));
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn submission(student: Uuid, at: chrono::DateTime<Utc>) -> AssignmentSubmission {
        AssignmentSubmission {
            id: Uuid::new_v4(),
            assignment_id: Uuid::nil(),
            student_id: student,
            status: AssignmentStatus::Submitted,
            content: None,
            points_earned: None,
            feedback: None,
            submitted_at: Some(at),
            graded_at: None,
        }
    }

    #[test]
    fn test_current_submission_is_latest_per_student() {
        let now = Utc::now();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let first = submission(alice, now - Duration::hours(2));
        let second = submission(alice, now);
        let other = submission(bob, now);
        let all = vec![first, second.clone(), other];

        let current = current_submissions(&all);

        assert_eq!(current.len(), 2);
        assert!(current.iter().any(|s| s.id == second.id));
    }

    #[test]
    fn test_status_wire_values() {
        let status: AssignmentStatus = serde_json::from_str("\"late\"").unwrap();
        assert!(status.awaits_grading());
        assert!(!AssignmentStatus::Graded.awaits_grading());
    }
}
