use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::entities::AssignmentStatus;

// 学生提交作业（来自HTTP请求）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct SubmitAssignmentRequest {
    pub assignment_id: Uuid,
    #[serde(default)]
    pub content: Option<String>,
}

// 教师批改（来自HTTP请求）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct GradeSubmissionRequest {
    pub points_earned: f64,
    #[serde(default)]
    pub feedback: Option<String>,
}

// 写入 assignment_submissions 的新行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSubmission {
    pub assignment_id: Uuid,
    pub student_id: Uuid,
    pub status: AssignmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

// 批改时的部分更新
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeUpdate {
    pub status: AssignmentStatus,
    pub points_earned: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub graded_at: chrono::DateTime<chrono::Utc>,
}
